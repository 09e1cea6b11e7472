use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("HOME not set")]
    NoHome,
}

/// Lint policy, read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Permit `"*"` constraints without a warning.
    pub allow_wildcard: bool,
    /// Treat sources with `verify_ssl = false` or plain-http URLs as errors.
    pub require_ssl: bool,
    /// Interpreter version every manifest must declare.
    pub python_version: Option<String>,
    /// Fail on warnings too.
    pub strict: bool,
    /// Issue codes to suppress.
    pub ignore: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            allow_wildcard: true,
            require_ssl: false,
            python_version: None,
            strict: false,
            ignore: Vec::new(),
        }
    }
}

impl LintConfig {
    /// Load from `$PIPSPEC_CONFIG`, falling back to
    /// `~/.config/pipspec/config.toml`. A missing file yields the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = match std::env::var_os("PIPSPEC_CONFIG") {
            Some(p) => PathBuf::from(p),
            None => default_config_path()?,
        };
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        debug!("loaded config from {}", path.display());
        Ok(toml::from_str(&content)?)
    }

    pub fn is_ignored(&self, code: &str) -> bool {
        self.ignore.iter().any(|c| c == code)
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/pipspec/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "allow_wildcard = false\nrequire_ssl = true\npython_version = \"3.8\"\nstrict = true\nignore = [\"no-source\"]\n",
        )
        .unwrap();

        let loaded = LintConfig::load(&path).unwrap();
        assert_eq!(
            loaded,
            LintConfig {
                allow_wildcard: false,
                require_ssl: true,
                python_version: Some("3.8".to_owned()),
                strict: true,
                ignore: vec!["no-source".to_owned()],
            }
        );
        assert!(loaded.is_ignored("no-source"));
        assert!(!loaded.is_ignored("dev-overlap"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "strict = true\n").unwrap();
        let loaded = LintConfig::load(&path).unwrap();
        assert!(loaded.strict);
        assert!(loaded.allow_wildcard);
        assert!(loaded.python_version.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "strictness = 3\n").unwrap();
        assert!(matches!(
            LintConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
