//! # Midas Encoding
//!
//! Stable, append-only dictionary that maps every schema token to a short
//! printable code.
//!
//! ## Pipeline
//!
//! ```text
//! ScanResult ──> DictionaryCodec
//!                  ├─> load()          artifact from disk (or empty)
//!                  ├─> merge()         append new tokens, check bitfields
//!                  ├─> assign_codes()  marker + bijective digits
//!                  └─> persist()       tmp file + rename
//! ```
//!
//! Codes depend only on a token's position in the pattern list and the
//! marker, so a code never changes once issued.
//!
//! ## Example
//!
//! ```no_run
//! use midas_encoding::DictionaryCodec;
//! use midas_schema::{load_schema, SchemaScanner};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tree = load_schema(Path::new("midas-tree.json"))?;
//!     let scan = SchemaScanner::new(&tree).scan();
//!     let report = DictionaryCodec::new("midas.cache", '~').update(&scan)?;
//!     println!("{} patterns", report.pattern_count);
//!     Ok(())
//! }
//! ```

mod alphabet;
mod artifact;
mod codec;
mod error;
mod lock;
mod lookup;

pub use alphabet::{
    parse_marker, Alphabet, ASCII_CEILING, ASCII_FLOOR, DEFAULT_MARKER, DENIED_CHARACTERS,
};
pub use artifact::{EncodingArtifact, EncodingDictionary};
pub use codec::{DictionaryCodec, MergeReport, UpdateReport, DEFAULT_ARTIFACT_FILE_NAME};
pub use error::{EncodingError, Result};
pub use lock::{lock_path_for_artifact, ArtifactWriteLock};
pub use lookup::CodeLookup;
