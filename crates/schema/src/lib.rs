//! # Midas Schema
//!
//! Typed model of the analytics state tree and the scanner that discovers
//! its vocabulary.
//!
//! ```text
//! midas-tree.json
//!     │
//!     ├──> SchemaNode (Map / Scalar / Enum / Opaque)
//!     │
//!     └──> SchemaScanner
//!            ├─> keys            (path segments)
//!            ├─> variant_sets    (enum leaves)
//!            └─> bitfield_paths  (all-boolean maps)
//! ```
//!
//! ## Example
//!
//! ```
//! use midas_schema::{parse_schema, SchemaScanner};
//!
//! let value = serde_json::json!({"Flags": {"A": "boolean", "B": "boolean"}});
//! let tree = parse_schema(&value).unwrap();
//! let scan = SchemaScanner::new(&tree).scan();
//! assert_eq!(scan.bitfield_paths["Flags"], vec!["A", "B"]);
//! ```

mod error;
mod scanner;
mod tree;

pub use error::{Result, SchemaError};
pub use scanner::{ScanResult, SchemaScanner, PATH_SEPARATOR};
pub use tree::{default_tree, load_schema, parse_schema, ScalarType, SchemaNode};
