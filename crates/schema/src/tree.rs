use crate::{Result, SchemaError};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Closed set of scalar type tags a leaf may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Boolean,
    Integer,
    Double,
    Float,
    String,
}

impl ScalarType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::String => "string",
        }
    }

    /// Parse a lowercase type tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "boolean" => Some(ScalarType::Boolean),
            "integer" => Some(ScalarType::Integer),
            "double" => Some(ScalarType::Double),
            "float" => Some(ScalarType::Float),
            "string" => Some(ScalarType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of the state tree.
///
/// Map children keep document order; the scanner relies on it for
/// deterministic token discovery and bitfield key order.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Map(IndexMap<String, SchemaNode>),
    Scalar(ScalarType),
    /// Enumerated leaf: the literal string variants it may take.
    Enum(Vec<String>),
    /// Anything the model does not recognise. Kept so that the key leading to
    /// it still counts, but it never contributes variants or bitfields.
    Opaque,
}

impl SchemaNode {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(entries) => SchemaNode::Map(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), SchemaNode::from_json(child)))
                    .collect(),
            ),
            Value::String(tag) => match ScalarType::parse(tag) {
                Some(scalar) => SchemaNode::Scalar(scalar),
                None => {
                    log::debug!("Treating unknown scalar tag {tag:?} as opaque");
                    SchemaNode::Opaque
                }
            },
            Value::Array(items) => {
                let variants: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                variants.map_or(SchemaNode::Opaque, SchemaNode::Enum)
            }
            _ => SchemaNode::Opaque,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SchemaNode::Map(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
            SchemaNode::Scalar(scalar) => Value::String(scalar.as_str().to_string()),
            SchemaNode::Enum(variants) => {
                Value::Array(variants.iter().cloned().map(Value::String).collect())
            }
            SchemaNode::Opaque => Value::Null,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, SchemaNode::Scalar(ScalarType::Boolean))
    }

    const fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Map(_) => "map",
            SchemaNode::Scalar(_) => "scalar",
            SchemaNode::Enum(_) => "enum",
            SchemaNode::Opaque => "opaque value",
        }
    }
}

/// Parse a schema document. The root must be a JSON object.
pub fn parse_schema(value: &Value) -> Result<SchemaNode> {
    let node = SchemaNode::from_json(value);
    if matches!(node, SchemaNode::Map(_)) {
        Ok(node)
    } else {
        Err(SchemaError::RootNotMap(node.kind()))
    }
}

pub fn load_schema(path: &Path) -> Result<SchemaNode> {
    let bytes = std::fs::read(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| SchemaError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&value)
}

/// Starter tree written by `midas init`.
pub fn default_tree() -> SchemaNode {
    fn map(entries: &[(&str, SchemaNode)]) -> SchemaNode {
        SchemaNode::Map(
            entries
                .iter()
                .map(|(key, node)| ((*key).to_string(), node.clone()))
                .collect(),
        )
    }
    let integer = SchemaNode::Scalar(ScalarType::Integer);
    let string = SchemaNode::Scalar(ScalarType::String);

    map(&[
        ("Duration", integer.clone()),
        ("IsStudio", SchemaNode::Scalar(ScalarType::Boolean)),
        (
            "Version",
            map(&[
                ("Build", integer.clone()),
                ("Major", integer.clone()),
                ("Minor", integer.clone()),
            ]),
        ),
        (
            "Index",
            map(&[("Total", integer.clone()), ("Event", integer)]),
        ),
        (
            "Id",
            map(&[
                ("Place", string.clone()),
                ("User", string.clone()),
                ("Session", string),
            ]),
        ),
    ])
}
