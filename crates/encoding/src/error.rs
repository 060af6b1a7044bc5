use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncodingError>;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "Invalid encoding marker {0:?}: expected a single printable character outside the denylist"
    )]
    InvalidMarker(String),

    #[error(
        "Encoding marker mismatch: artifact uses {persisted:?} but configuration uses {configured:?}"
    )]
    MarkerMismatch { persisted: String, configured: char },

    #[error("Bitfield at {path} is desynced at entry {index}: expected {expected:?}, found {found:?}")]
    BitfieldDesync {
        path: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Bitfield at {path} shrank from {previous} to {current} entries")]
    BitfieldShrunk {
        path: String,
        previous: usize,
        current: usize,
    },

    #[error("Bitfield at {path} gained non-boolean children and can no longer be bit-encoded")]
    BitfieldMixed { path: String },

    #[error("Malformed encoding artifact {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("No bitfield registered at {0}")]
    UnknownBitfield(String),

    #[error("Bit position {index} is not registered for bitfield {path}")]
    UnknownBitPosition { path: String, index: usize },

    #[error("Lock error: {0}")]
    Lock(String),
}

impl EncodingError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
