//! `tfl-opgen.toml` loading and merging with command-line overrides.
//!
//! ```toml
//! registry = "ops.pbtxt"
//! docs = "docs"
//! names = "raw_ops.txt"
//! output = "raw_ops.lua"
//! private_prefix = "_"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tfl_opgen_core::DEFAULT_PRIVATE_PREFIX;
use tracing::debug;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tfl-opgen.toml";

/// Contents of a config file; every key optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Operation registry (`.pbtxt`, `.txt` or `.json`).
    pub registry: Option<PathBuf>,
    /// Docs directory of `<Op>.txt`, or a `.json`/`.yaml` map.
    pub docs: Option<PathBuf>,
    /// Reflected operation names, one per line.
    pub names: Option<PathBuf>,
    /// Generated module path.
    pub output: Option<PathBuf>,
    /// Prefix marking private operation names.
    pub private_prefix: Option<String>,
}

/// Fully merged settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Operation registry.
    pub registry: PathBuf,
    /// Docstring source, if any.
    pub docs: Option<PathBuf>,
    /// Reflected names file; every registry op when absent.
    pub names: Option<PathBuf>,
    /// Generated module path.
    pub output: PathBuf,
    /// Prefix marking private operation names.
    pub private_prefix: String,
}

impl ConfigFile {
    /// Parse a config file; relative paths are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read config file {}: {err}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|err| format!("Failed to parse config file {}: {err}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(path = %path.display(), "Loaded config file.");
        Ok(config.relative_to(base))
    }

    /// Load `explicit` if given (it must exist), else the default file if present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, String> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn relative_to(self, base: &Path) -> Self {
        let resolve = |p: Option<PathBuf>| {
            p.map(|p| if p.is_relative() { base.join(p) } else { p })
        };
        Self {
            registry: resolve(self.registry),
            docs: resolve(self.docs),
            names: resolve(self.names),
            output: resolve(self.output),
            private_prefix: self.private_prefix,
        }
    }

    /// Apply `overrides` on top of this file and check required keys.
    pub fn merge(self, overrides: Self) -> Result<Settings, String> {
        let registry = overrides
            .registry
            .or(self.registry)
            .ok_or("No registry given: pass --registry or set `registry` in the config file")?;
        let output = overrides
            .output
            .or(self.output)
            .ok_or("No output given: pass --output or set `output` in the config file")?;
        Ok(Settings {
            registry,
            docs: overrides.docs.or(self.docs),
            names: overrides.names.or(self.names),
            output,
            private_prefix: overrides
                .private_prefix
                .or(self.private_prefix)
                .unwrap_or_else(|| DEFAULT_PRIVATE_PREFIX.to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config: ConfigFile = toml::from_str(
            r#"
registry = "ops.pbtxt"
docs = "docs"
names = "raw_ops.txt"
output = "out/raw_ops.lua"
private_prefix = "__"
"#,
        )
        .unwrap();
        assert_eq!(config.registry, Some(PathBuf::from("ops.pbtxt")));
        assert_eq!(config.private_prefix.as_deref(), Some("__"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ConfigFile>("registy = \"ops.pbtxt\"").is_err());
    }

    #[test]
    fn relative_paths_follow_the_file() {
        let config = ConfigFile {
            registry: Some("ops.pbtxt".into()),
            output: Some("/abs/raw_ops.lua".into()),
            ..Default::default()
        }
        .relative_to(Path::new("/project"));
        assert_eq!(config.registry, Some(PathBuf::from("/project/ops.pbtxt")));
        assert_eq!(config.output, Some(PathBuf::from("/abs/raw_ops.lua")));
    }

    #[test]
    fn overrides_win() {
        let file = ConfigFile {
            registry: Some("a.pbtxt".into()),
            output: Some("a.lua".into()),
            private_prefix: Some("__".into()),
            ..Default::default()
        };
        let overrides = ConfigFile {
            output: Some("b.lua".into()),
            ..Default::default()
        };
        let settings = file.merge(overrides).unwrap();
        assert_eq!(settings.registry, PathBuf::from("a.pbtxt"));
        assert_eq!(settings.output, PathBuf::from("b.lua"));
        assert_eq!(settings.private_prefix, "__");
        assert_eq!(settings.docs, None);
    }

    #[test]
    fn missing_required_keys() {
        let err = ConfigFile::default().merge(ConfigFile::default()).unwrap_err();
        assert!(err.contains("registry"));
        let only_registry = ConfigFile {
            registry: Some("ops.pbtxt".into()),
            ..Default::default()
        };
        let err = only_registry.merge(ConfigFile::default()).unwrap_err();
        assert!(err.contains("output"));
    }

    #[test]
    fn default_prefix() {
        let settings = ConfigFile {
            registry: Some("ops.pbtxt".into()),
            output: Some("raw_ops.lua".into()),
            ..Default::default()
        }
        .merge(ConfigFile::default())
        .unwrap();
        assert_eq!(settings.private_prefix, "_");
    }
}
