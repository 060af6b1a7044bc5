use crate::alphabet::Alphabet;
use crate::artifact::EncodingArtifact;
use crate::lock::{sibling_with_suffix, ArtifactWriteLock};
use crate::{EncodingError, Result};
use midas_schema::ScanResult;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default artifact file name, relative to the project root.
pub const DEFAULT_ARTIFACT_FILE_NAME: &str = "midas.cache";

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Tokens appended to the pattern list, in append order.
    pub appended_tokens: Vec<String>,
    /// Bitfield paths seen for the first time.
    pub registered_bitfields: Vec<String>,
    /// Existing bitfield paths that gained keys at the end.
    pub extended_bitfields: Vec<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.appended_tokens.is_empty()
            && self.registered_bitfields.is_empty()
            && self.extended_bitfields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub artifact_path: PathBuf,
    pub marker: char,
    pub pattern_count: usize,
    pub codes_assigned: usize,
    #[serde(flatten)]
    pub merge: MergeReport,
}

/// Reconciles scanned vocabulary with the persisted artifact.
///
/// The codec owns no artifact state: callers load an [`EncodingArtifact`],
/// pass it through [`merge`](Self::merge) and [`assign_codes`](Self::assign_codes),
/// and hand it back to [`persist`](Self::persist). [`update`](Self::update)
/// runs the whole sequence under the artifact write lock.
#[derive(Debug, Clone)]
pub struct DictionaryCodec {
    path: PathBuf,
    alphabet: Alphabet,
}

impl DictionaryCodec {
    pub fn new(path: impl Into<PathBuf>, marker: char) -> Self {
        Self {
            path: path.into(),
            alphabet: Alphabet::new(marker),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn marker(&self) -> char {
        self.alphabet.marker()
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Read the persisted artifact, or start an empty one if none exists.
    pub fn load(&self) -> Result<EncodingArtifact> {
        if !self.path.exists() {
            log::info!(
                "No encoding artifact at {}, starting a new one",
                self.path.display()
            );
            return Ok(EncodingArtifact::empty(self.marker()));
        }

        let bytes = std::fs::read(&self.path)?;
        let artifact: EncodingArtifact = serde_json::from_slice(&bytes)
            .map_err(|err| EncodingError::malformed(&self.path, err.to_string()))?;
        artifact.validate(&self.path, self.marker())?;
        log::debug!(
            "Loaded encoding artifact {} ({} patterns, {} bitfields)",
            self.path.display(),
            artifact.patterns.len(),
            artifact.arrays.len()
        );
        Ok(artifact)
    }

    /// Fold a scan into `artifact`.
    ///
    /// Every bitfield is checked before anything is modified, so on error the
    /// artifact is left exactly as it was passed in.
    pub fn merge(
        &self,
        artifact: &mut EncodingArtifact,
        scan: &ScanResult,
    ) -> Result<MergeReport> {
        self.ensure_marker(artifact)?;

        let mut report = MergeReport::default();
        for (path, keys) in &scan.bitfield_paths {
            match artifact.arrays.get(path) {
                Some(previous) => {
                    check_bitfield(path, previous, keys)?;
                    if keys.len() > previous.len() {
                        report.extended_bitfields.push(path.clone());
                    }
                }
                None => report.registered_bitfields.push(path.clone()),
            }
        }
        for path in artifact.arrays.keys() {
            if scan.map_paths.contains(path.as_str())
                && !scan.bitfield_paths.contains_key(path.as_str())
            {
                return Err(EncodingError::BitfieldMixed { path: path.clone() });
            }
        }

        let known: HashSet<&str> = artifact.patterns.iter().map(String::as_str).collect();
        report.appended_tokens = scan
            .tokens
            .iter()
            .filter(|token| !known.contains(token.as_str()))
            .cloned()
            .collect();
        artifact
            .patterns
            .extend(report.appended_tokens.iter().cloned());

        for path in report
            .registered_bitfields
            .iter()
            .chain(report.extended_bitfields.iter())
        {
            artifact
                .arrays
                .insert(path.clone(), scan.bitfield_paths[path.as_str()].clone());
        }

        for path in artifact.arrays.keys() {
            if !scan.map_paths.contains(path.as_str()) {
                log::warn!(
                    "Bitfield {path} is no longer a map in the schema; keeping its registry entry"
                );
            }
        }

        for token in &report.appended_tokens {
            log::debug!("New pattern {token:?}");
        }
        Ok(report)
    }

    /// Give every scanned key and enum variant that lacks a code the code of
    /// its pattern position. Existing entries are never rewritten. Returns the
    /// number of codes added.
    pub fn assign_codes(&self, artifact: &mut EncodingArtifact, scan: &ScanResult) -> usize {
        let positions: HashMap<String, usize> = artifact
            .patterns
            .iter()
            .enumerate()
            .map(|(idx, pattern)| (pattern.clone(), idx + 1))
            .collect();
        let code_for = |token: &str| -> Option<String> {
            let position = positions.get(token);
            if position.is_none() {
                log::warn!(
                    "Token {token:?} is not in the pattern list; merge before assigning codes"
                );
            }
            position.map(|&position| self.alphabet.code(position))
        };

        let mut assigned = 0usize;
        for key in &scan.keys {
            if artifact.dictionary.properties.contains_key(key) {
                continue;
            }
            if let Some(code) = code_for(key.as_str()) {
                artifact.dictionary.properties.insert(key.clone(), code);
                assigned += 1;
            }
        }

        for (path, variants) in &scan.variant_sets {
            let entries = artifact.dictionary.values.entry(path.clone()).or_default();
            for variant in variants {
                if entries.contains_key(variant) {
                    continue;
                }
                if let Some(code) = code_for(variant.as_str()) {
                    entries.insert(variant.clone(), code);
                    assigned += 1;
                }
            }
        }
        assigned
    }

    /// Write the artifact to `<path>.tmp`, sync it, then rename it over the
    /// artifact so readers never see a partial file.
    pub fn persist(&self, artifact: &EncodingArtifact) -> Result<()> {
        self.ensure_marker(artifact)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(artifact)?;
        let tmp = sibling_with_suffix(&self.path, ".tmp");
        let written = write_synced(&tmp, &bytes).and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(err) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove {}: {cleanup}", tmp.display());
                }
            }
            return Err(err.into());
        }
        log::debug!("Persisted encoding artifact {}", self.path.display());
        Ok(())
    }

    /// Load, merge, assign and persist in one locked step. Nothing is written
    /// if any check fails.
    pub fn update(&self, scan: &ScanResult) -> Result<UpdateReport> {
        let _lock = ArtifactWriteLock::acquire(&self.path)?;

        let mut artifact = self.load()?;
        let merge = self.merge(&mut artifact, scan)?;
        let codes_assigned = self.assign_codes(&mut artifact, scan);
        self.persist(&artifact)?;

        log::info!(
            "Encoding updated: {} new patterns ({} total), {} new codes, {} new / {} extended bitfields",
            merge.appended_tokens.len(),
            artifact.patterns.len(),
            codes_assigned,
            merge.registered_bitfields.len(),
            merge.extended_bitfields.len()
        );

        Ok(UpdateReport {
            artifact_path: self.path.clone(),
            marker: self.marker(),
            pattern_count: artifact.patterns.len(),
            codes_assigned,
            merge,
        })
    }

    fn ensure_marker(&self, artifact: &EncodingArtifact) -> Result<()> {
        let mut chars = artifact.marker.chars();
        if chars.next() == Some(self.marker()) && chars.next().is_none() {
            return Ok(());
        }
        Err(EncodingError::MarkerMismatch {
            persisted: artifact.marker.clone(),
            configured: self.marker(),
        })
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// `previous` must be an unmodified prefix of `current`.
fn check_bitfield(path: &str, previous: &[String], current: &[String]) -> Result<()> {
    for (index, (expected, found)) in previous.iter().zip(current).enumerate() {
        if expected != found {
            return Err(EncodingError::BitfieldDesync {
                path: path.to_string(),
                index,
                expected: expected.clone(),
                found: found.clone(),
            });
        }
    }
    if current.len() < previous.len() {
        return Err(EncodingError::BitfieldShrunk {
            path: path.to_string(),
            previous: previous.len(),
            current: current.len(),
        });
    }
    Ok(())
}
