use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::generator::GeneratorOptions;
use crate::lower::Target;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "ts2vtl.yaml";

/// Settings read from `ts2vtl.yaml`. Every field is optional; command line
/// flags override what is set here.
///
/// ```yaml
/// target: apigateway
/// generator:
///   indent_text: "    "
///   strip_comments: true
/// out_dir: templates
/// validate: true
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ts2VtlConfig {
    pub target: Target,
    pub generator: GeneratorOptions,
    pub out_dir: Option<PathBuf>,
    pub validate: bool,
}

impl Ts2VtlConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Ts2VtlConfig::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        let config = Self::from_yaml(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else `ts2vtl.yaml` from `dir` if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> CliResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::load(&fallback)
        } else {
            Ok(Ts2VtlConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config = Ts2VtlConfig::from_yaml("").unwrap();
        assert_eq!(config, Ts2VtlConfig::default());
        assert_eq!(config.target, Target::Appsync);
        assert!(config.generator.indent_enabled);
        assert_eq!(config.generator.indent_text, "  ");
        assert!(!config.validate);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Ts2VtlConfig::from_yaml(
            "target: apigateway\ngenerator:\n  strip_comments: true\nvalidate: true\n",
        )
        .unwrap();
        assert_eq!(config.target, Target::Apigateway);
        assert!(config.generator.strip_comments);
        assert!(config.generator.indent_enabled);
        assert_eq!(config.generator.indent_text, "  ");
        assert!(config.validate);
        assert_eq!(config.out_dir, None);
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(Ts2VtlConfig::from_yaml("target: lambda\n").is_err());
    }

    #[test]
    fn discover_prefers_explicit_then_default_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Ts2VtlConfig::discover(None, dir.path()).unwrap(),
            Ts2VtlConfig::default()
        );

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "out_dir: out\n").unwrap();
        let config = Ts2VtlConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.out_dir, Some(PathBuf::from("out")));

        let explicit = dir.path().join("other.yaml");
        std::fs::write(&explicit, "target: [\n").unwrap();
        match Ts2VtlConfig::discover(Some(&explicit), dir.path()) {
            Err(CliError::Config { path, .. }) => assert_eq!(path, explicit),
            other => panic!("unexpected {:?}", other),
        }
    }
}
