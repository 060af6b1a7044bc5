use crate::alphabet::{parse_marker, Alphabet};
use crate::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Code maps persisted alongside the pattern list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingDictionary {
    /// Path-segment token -> code.
    pub properties: BTreeMap<String, String>,
    /// Enum path -> (variant -> code).
    pub values: BTreeMap<String, BTreeMap<String, String>>,
}

/// The persisted encoding dictionary.
///
/// `patterns` is append-only: the 1-based position of a token is its permanent
/// identity and determines its code. `arrays` is the bitfield registry; every
/// list in it only ever grows at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingArtifact {
    pub marker: String,
    pub patterns: Vec<String>,
    pub dictionary: EncodingDictionary,
    pub arrays: BTreeMap<String, Vec<String>>,
}

impl EncodingArtifact {
    pub fn empty(marker: char) -> Self {
        Self {
            marker: marker.to_string(),
            patterns: Vec::new(),
            dictionary: EncodingDictionary::default(),
            arrays: BTreeMap::new(),
        }
    }

    /// 1-based position of `token` in the pattern list.
    pub fn position(&self, token: &str) -> Option<usize> {
        self.patterns
            .iter()
            .position(|pattern| pattern == token)
            .map(|idx| idx + 1)
    }

    pub fn property_code(&self, key: &str) -> Option<&str> {
        self.dictionary.properties.get(key).map(String::as_str)
    }

    pub fn variant_code(&self, path: &str, variant: &str) -> Option<&str> {
        self.dictionary
            .values
            .get(path)
            .and_then(|variants| variants.get(variant))
            .map(String::as_str)
    }

    pub fn bitfield(&self, path: &str) -> Option<&[String]> {
        self.arrays.get(path).map(Vec::as_slice)
    }

    /// Pair recorded bits with the registered keys of the bitfield at `path`.
    ///
    /// Records written before the bitfield was extended carry fewer bits; only
    /// the positions present in `bits` are returned.
    pub fn decode_bitfield<'a>(
        &'a self,
        path: &str,
        bits: &[bool],
    ) -> Result<Vec<(&'a str, bool)>> {
        let keys = self
            .arrays
            .get(path)
            .ok_or_else(|| EncodingError::UnknownBitfield(path.to_string()))?;
        if bits.len() > keys.len() {
            return Err(EncodingError::UnknownBitPosition {
                path: path.to_string(),
                index: keys.len(),
            });
        }
        Ok(keys
            .iter()
            .map(String::as_str)
            .zip(bits.iter().copied())
            .collect())
    }

    /// Structural checks run on every artifact read from disk. `origin` is
    /// only used for error context.
    pub(crate) fn validate(&self, origin: &Path, configured: char) -> Result<()> {
        let persisted = parse_marker(&self.marker).map_err(|_| {
            EncodingError::malformed(origin, format!("invalid marker {:?}", self.marker))
        })?;
        if persisted != configured {
            return Err(EncodingError::MarkerMismatch {
                persisted: self.marker.clone(),
                configured,
            });
        }

        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(self.patterns.len());
        for (idx, pattern) in self.patterns.iter().enumerate() {
            if positions.insert(pattern.as_str(), idx + 1).is_some() {
                return Err(EncodingError::malformed(
                    origin,
                    format!("pattern {pattern:?} appears more than once"),
                ));
            }
        }

        let alphabet = Alphabet::new(persisted);
        let check = |token: &str, code: &str, section: &str| -> Result<()> {
            let Some(&position) = positions.get(token) else {
                return Err(EncodingError::malformed(
                    origin,
                    format!("{section} entry {token:?} is not in the pattern list"),
                ));
            };
            let expected = alphabet.code(position);
            if code != expected {
                return Err(EncodingError::malformed(
                    origin,
                    format!("{section} entry {token:?} has code {code:?}, expected {expected:?}"),
                ));
            }
            Ok(())
        };

        for (key, code) in &self.dictionary.properties {
            check(key.as_str(), code.as_str(), "properties")?;
        }
        for (path, variants) in &self.dictionary.values {
            for (variant, code) in variants {
                check(variant.as_str(), code.as_str(), format!("values[{path}]").as_str())?;
            }
        }
        Ok(())
    }
}
