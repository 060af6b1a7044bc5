use crate::{EncodingError, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Exclusive advisory lock guarding one artifact path. Released on drop.
pub struct ArtifactWriteLock {
    file: std::fs::File,
    path: PathBuf,
}

impl ArtifactWriteLock {
    /// Block until the lock next to `artifact_path` is held exclusively.
    pub fn acquire(artifact_path: &Path) -> Result<Self> {
        let path = lock_path_for_artifact(artifact_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                EncodingError::Lock(format!("open artifact lock {}: {err}", path.display()))
            })?;

        let start = Instant::now();
        file.lock_exclusive().map_err(|err| {
            EncodingError::Lock(format!("acquire artifact lock {}: {err}", path.display()))
        })?;
        log::debug!(
            "Acquired artifact lock {} after {} ms",
            path.display(),
            start.elapsed().as_millis()
        );

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// `<artifact>.lock` beside the artifact itself.
pub fn lock_path_for_artifact(artifact_path: &Path) -> PathBuf {
    sibling_with_suffix(artifact_path, ".lock")
}

pub(crate) fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_artifact() {
        assert_eq!(
            lock_path_for_artifact(Path::new("out/midas.cache")),
            PathBuf::from("out/midas.cache.lock")
        );
    }

    #[test]
    fn second_try_lock_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("midas.cache");
        let held = ArtifactWriteLock::acquire(&artifact).unwrap();

        let other = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(held.path())
            .unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(held);
        other.try_lock_exclusive().unwrap();
    }
}
