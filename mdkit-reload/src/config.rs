use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::error::{ReloadError, ReloadResult};

/// What to watch and how long to wait.
///
/// ```
/// use mdkit_reload::ReloadConfig;
///
/// let config = ReloadConfig::from_toml_str(r#"
///     watch_paths = ["src", "ui"]
///     extensions = ["kv"]
///     debounce_ms = 150
/// "#).unwrap();
/// assert_eq!(config.debounce().as_millis(), 150);
/// assert!(config.matches(std::path::Path::new("ui/main.kv")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(default, deny_unknown_fields)]
pub struct ReloadConfig {
    /// Files and directories to watch; directories recursively.
    pub watch_paths: Vec<PathBuf>,
    /// File extensions that trigger a reload, without the dot. Empty accepts
    /// every file.
    pub extensions: Vec<String>,
    /// Quiet period after the last change before rebuilding.
    pub debounce_ms: u64,
    /// Longest the prepare step may run.
    pub build_timeout_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch_paths: vec![PathBuf::from("src")],
            extensions: ["rs", "kv", "toml"].map(String::from).to_vec(),
            debounce_ms: 300,
            build_timeout_ms: 10_000,
        }
    }
}

impl ReloadConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> ReloadResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ReloadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReloadError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Quiet period as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Build timeout as a duration.
    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }

    /// Whether a change to `path` should trigger a reload.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_watch_sources_and_markup() {
        let config = ReloadConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.build_timeout(), Duration::from_secs(10));
        assert!(config.matches(Path::new("src/app.rs")));
        assert!(config.matches(Path::new("ui/screen.KV")));
        assert!(!config.matches(Path::new("target/app.o")));
        assert!(!config.matches(Path::new("Makefile")));
        assert!(ReloadConfig::default().extensions(Vec::new()).matches(Path::new("Makefile")));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ReloadConfig::from_toml_str("debounce = 3").unwrap_err();
        assert!(matches!(err, ReloadError::ConfigParse(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reload.toml");
        std::fs::write(&path, "build_timeout_ms = 2500\n").unwrap();
        let config = ReloadConfig::load(&path).unwrap();
        assert_eq!(config.build_timeout(), Duration::from_millis(2500));
        assert_eq!(config.watch_paths, [PathBuf::from("src")]);

        let missing = ReloadConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ReloadError::ConfigRead { .. }));
    }
}
