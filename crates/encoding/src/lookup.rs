use crate::alphabet::{parse_marker, Alphabet};
use crate::artifact::EncodingArtifact;
use crate::{EncodingError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Forward and reverse code tables for decoding recorded data.
///
/// Built once per artifact; both directions are hash lookups.
#[derive(Debug, Clone)]
pub struct CodeLookup {
    by_code: HashMap<String, String>,
    by_token: HashMap<String, String>,
}

impl CodeLookup {
    pub fn new(artifact: &EncodingArtifact) -> Result<Self> {
        let marker = parse_marker(&artifact.marker).map_err(|_| {
            EncodingError::malformed(
                Path::new("<in-memory>"),
                format!("invalid marker {:?}", artifact.marker),
            )
        })?;
        let alphabet = Alphabet::new(marker);

        let mut by_code = HashMap::with_capacity(artifact.patterns.len());
        let mut by_token = HashMap::with_capacity(artifact.patterns.len());
        for (idx, token) in artifact.patterns.iter().enumerate() {
            let code = alphabet.code(idx + 1);
            by_code.insert(code.clone(), token.clone());
            by_token.insert(token.clone(), code);
        }
        Ok(Self { by_code, by_token })
    }

    pub fn token(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    pub fn code(&self, token: &str) -> Option<&str> {
        self.by_token.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverts_every_pattern_code() {
        let mut artifact = EncodingArtifact::empty('~');
        artifact.patterns = (0..200).map(|i| format!("token{i}")).collect();
        let lookup = CodeLookup::new(&artifact).unwrap();
        assert_eq!(lookup.len(), 200);
        for token in &artifact.patterns {
            let code = lookup.code(token).expect("code");
            assert!(code.starts_with('~'));
            assert_eq!(lookup.token(code), Some(token.as_str()));
        }
        assert_eq!(lookup.token("~ZZZ"), None);
    }
}
