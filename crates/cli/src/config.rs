use anyhow::{Context, Result};
use midas_encoding::{parse_marker, DEFAULT_ARTIFACT_FILE_NAME, DEFAULT_MARKER};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "midas.toml";
pub const TREE_FILE_NAME: &str = "midas-tree.json";
pub const MARKER_ENV: &str = "MIDAS_ENCODING_MARKER";

/// Contents of `midas.toml`. Tables this tool does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidasConfig {
    pub encoding_marker: String,
    pub tree_path: PathBuf,
    pub encoding_path: PathBuf,
}

impl Default for MidasConfig {
    fn default() -> Self {
        Self {
            encoding_marker: DEFAULT_MARKER.to_string(),
            tree_path: PathBuf::from(TREE_FILE_NAME),
            encoding_path: PathBuf::from(DEFAULT_ARTIFACT_FILE_NAME),
        }
    }
}

/// Config with the marker validated and paths made relative to the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub marker: char,
    pub tree_path: PathBuf,
    pub encoding_path: PathBuf,
}

impl MidasConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid midas.toml")
    }

    pub fn load(path: &Path) -> Result<ResolvedConfig> {
        let raw = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Cannot read {} (run `midas init` to create one)",
                path.display()
            )
        })?;
        let config =
            Self::parse(&raw).with_context(|| format!("Failed to parse {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve(base, env::var(MARKER_ENV).ok())
    }

    pub fn resolve(
        &self,
        base: &Path,
        marker_override: Option<String>,
    ) -> Result<ResolvedConfig> {
        let raw_marker = marker_override.unwrap_or_else(|| self.encoding_marker.clone());
        let marker = parse_marker(&raw_marker)?;
        Ok(ResolvedConfig {
            marker,
            tree_path: base.join(&self.tree_path),
            encoding_path: base.join(&self.encoding_path),
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize midas.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = MidasConfig::parse("").unwrap();
        assert_eq!(config, MidasConfig::default());
    }

    #[test]
    fn ignores_unrelated_tables() {
        let config = MidasConfig::parse(
            r##"
            download = true
            encoding_marker = "#"

            [playfab]
            download_window = 30

            [build]
            shared_state_tree_path = "src/Shared/MidasTree.luau"
            "##,
        )
        .unwrap();
        assert_eq!(config.encoding_marker, "#");
        assert_eq!(config.encoding_path, PathBuf::from("midas.cache"));
    }

    #[test]
    fn resolves_paths_against_config_dir() {
        let config = MidasConfig {
            encoding_marker: "~".into(),
            tree_path: "schema/tree.json".into(),
            encoding_path: "midas.cache".into(),
        };
        let resolved = config.resolve(Path::new("/project"), None).unwrap();
        assert_eq!(resolved.marker, '~');
        assert_eq!(resolved.tree_path, PathBuf::from("/project/schema/tree.json"));
        assert_eq!(resolved.encoding_path, PathBuf::from("/project/midas.cache"));
    }

    #[test]
    fn marker_override_wins_and_is_validated() {
        let config = MidasConfig::default();
        let resolved = config.resolve(Path::new(""), Some("@".into())).unwrap();
        assert_eq!(resolved.marker, '@');
        assert!(config.resolve(Path::new(""), Some("@@".into())).is_err());
        assert!(config.resolve(Path::new(""), Some("\"".into())).is_err());
    }

    #[test]
    fn default_template_round_trips() {
        let raw = MidasConfig::default().to_toml().unwrap();
        assert_eq!(MidasConfig::parse(&raw).unwrap(), MidasConfig::default());
    }
}
