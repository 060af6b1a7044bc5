use crate::tree::SchemaNode;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Separator between key segments in a schema path (`Id/User`).
pub const PATH_SEPARATOR: &str = "/";

/// Vocabulary discovered in one schema tree. No codes are assigned here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Map-key segments, in first-discovery order.
    pub keys: IndexSet<String>,
    /// Enumerated leaves: path -> variants as listed in the schema.
    pub variant_sets: IndexMap<String, Vec<String>>,
    /// Maps whose children are all `boolean`: path -> child keys in schema order.
    pub bitfield_paths: IndexMap<String, Vec<String>>,
    /// Every non-root map, bitfield or not.
    pub map_paths: IndexSet<String>,
    /// Every token (keys and variants) in first-discovery order.
    pub tokens: IndexSet<String>,
    /// Paths reached by more than one node because a key contains the
    /// separator. The first node keeps the path.
    pub path_collisions: IndexSet<String>,
}

impl ScanResult {
    pub fn is_key(&self, token: &str) -> bool {
        self.keys.contains(token)
    }
}

/// Walks a schema tree and classifies every node.
pub struct SchemaScanner<'a> {
    root: &'a SchemaNode,
}

impl<'a> SchemaScanner<'a> {
    pub fn new(root: &'a SchemaNode) -> Self {
        Self { root }
    }

    pub fn scan(&self) -> ScanResult {
        let mut visitor = Visitor {
            segments: Vec::new(),
            out: ScanResult::default(),
        };
        if let SchemaNode::Map(children) = self.root {
            visitor.visit_children(children);
        }

        let out = visitor.out;
        log::debug!(
            "Scanned schema: {} keys, {} enum paths, {} bitfield paths, {} tokens",
            out.keys.len(),
            out.variant_sets.len(),
            out.bitfield_paths.len(),
            out.tokens.len()
        );
        out
    }
}

struct Visitor<'a> {
    segments: Vec<&'a str>,
    out: ScanResult,
}

impl<'a> Visitor<'a> {
    fn visit_children(&mut self, children: &'a IndexMap<String, SchemaNode>) {
        for (key, child) in children {
            if !is_index_segment(key) {
                self.out.keys.insert(key.clone());
                self.out.tokens.insert(key.clone());
            }
            self.segments.push(key);
            self.visit_node(child);
            self.segments.pop();
        }
    }

    fn visit_node(&mut self, node: &'a SchemaNode) {
        match node {
            SchemaNode::Map(children) => {
                let path = self.path();
                if self.claim(&path) {
                    if children.values().all(SchemaNode::is_boolean) {
                        self.out
                            .bitfield_paths
                            .insert(path.clone(), children.keys().cloned().collect());
                    }
                    self.out.map_paths.insert(path);
                }
                self.visit_children(children);
            }
            SchemaNode::Enum(variants) => {
                for variant in variants {
                    self.out.tokens.insert(variant.clone());
                }
                let path = self.path();
                if self.claim(&path) {
                    self.out.variant_sets.insert(path, variants.clone());
                }
            }
            SchemaNode::Scalar(_) | SchemaNode::Opaque => {}
        }
    }

    fn path(&self) -> String {
        self.segments.join(PATH_SEPARATOR)
    }

    /// First node to reach `path` owns it. Later ones are recorded as collisions.
    fn claim(&mut self, path: &str) -> bool {
        if !self.out.map_paths.contains(path) && !self.out.variant_sets.contains_key(path) {
            return true;
        }
        log::warn!("Schema path {path} is reached by more than one node; keeping the first");
        self.out.path_collisions.insert(path.to_string());
        false
    }
}

/// List indices show up as purely numeric segments; they are never tokens.
fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
