//! Sandbox configuration and its validation.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! named by `CODE_SANDBOX_CONFIG`, then individual environment overrides:
//! - `CODE_SANDBOX_TIMEOUT` - deadline in whole seconds
//! - `CODE_SANDBOX_PYTHON` - interpreter binary
//! - `CODE_SANDBOX_SCRATCH_DIR` - directory for generated scripts

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Interpreter used when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Deadline used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Timeouts above this are probably a misconfiguration.
const LONG_TIMEOUT_SECS: u64 = 600;

/// Configuration for an [`crate::IsolatedRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Wall-clock deadline per execution, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Interpreter binary used to run generated scripts.
    #[serde(default = "default_python")]
    pub python: String,

    /// Directory for generated scripts; system temp dir when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_python() -> String {
    DEFAULT_PYTHON.to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            python: default_python(),
            scratch_dir: None,
        }
    }
}

impl SandboxConfig {
    /// Returns the deadline as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sets the deadline in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies the layering rules using `lookup` for variable access.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("CODE_SANDBOX_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(timeout) = lookup("CODE_SANDBOX_TIMEOUT") {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "CODE_SANDBOX_TIMEOUT must be a whole number of seconds, got '{}'",
                    timeout
                ))
            })?;
        }

        if let Some(python) = lookup("CODE_SANDBOX_PYTHON") {
            config.python = python;
        }

        if let Some(dir) = lookup("CODE_SANDBOX_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Validates, returning the warnings or a config error naming every problem.
    pub fn validated(&self) -> Result<Vec<String>> {
        self.validate().into_result()
    }
}

/// Validation result containing all found issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors (fatal).
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Converts to a Result, failing if there are errors.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(Error::Config(self.errors.join("; ")))
        }
    }
}

/// Trait for validatable configuration types.
pub trait Validate {
    /// Validates the configuration and returns any issues found.
    fn validate(&self) -> ValidationResult;
}

impl Validate for SandboxConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.timeout_secs == 0 {
            result.add_error("timeout_secs must be positive");
        }

        if self.timeout_secs > LONG_TIMEOUT_SECS {
            result.add_warning(format!(
                "timeout_secs over {} seconds may indicate a misconfiguration",
                LONG_TIMEOUT_SECS
            ));
        }

        if self.python.trim().is_empty() {
            result.add_error("python interpreter cannot be empty");
        }

        if let Some(dir) = &self.scratch_dir {
            if !dir.is_dir() {
                result.add_warning(format!(
                    "scratch_dir '{}' does not exist, executions will fail to start",
                    dir.display()
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn config_has_sensible_defaults() {
        let config = SandboxConfig::default();

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.python, "python3");
        assert!(config.scratch_dir.is_none());
        assert!(config.validate().is_valid());
    }

    #[test]
    fn toml_missing_keys_take_defaults() {
        let config = SandboxConfig::from_toml_str("timeout_secs = 60\n").unwrap();

        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.python, DEFAULT_PYTHON);
    }

    #[test]
    fn toml_rejects_wrong_types() {
        assert!(SandboxConfig::from_toml_str("timeout_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("sandbox.toml");
        std::fs::write(&path, "timeout_secs = 60\npython = \"python3.11\"\n").unwrap();

        let config = SandboxConfig::from_lookup(lookup_from(&[
            ("CODE_SANDBOX_CONFIG", path.to_str().unwrap()),
            ("CODE_SANDBOX_TIMEOUT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.python, "python3.11");
    }

    #[test]
    fn env_sets_python_and_scratch_dir() {
        let config = SandboxConfig::from_lookup(lookup_from(&[
            ("CODE_SANDBOX_PYTHON", "/opt/py/bin/python"),
            ("CODE_SANDBOX_SCRATCH_DIR", "/var/tmp/sandbox"),
        ]))
        .unwrap();

        assert_eq!(config.python, "/opt/py/bin/python");
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/tmp/sandbox")));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn bad_timeout_env_is_config_error() {
        let result = SandboxConfig::from_lookup(lookup_from(&[("CODE_SANDBOX_TIMEOUT", "1.5")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let result = SandboxConfig::from_lookup(lookup_from(&[(
            "CODE_SANDBOX_CONFIG",
            "/definitely/not/here.toml",
        )]));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn malformed_config_file_is_parse_error() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("sandbox.toml");
        std::fs::write(&path, "timeout_secs = [").unwrap();

        assert!(matches!(
            SandboxConfig::from_file(&path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn validation_catches_zero_timeout_and_empty_python() {
        let config = SandboxConfig {
            timeout_secs: 0,
            python: "  ".to_string(),
            scratch_dir: None,
        };

        let result = config.validate();
        assert_eq!(result.errors.len(), 2);
        assert!(config.validated().is_err());
    }

    #[test]
    fn validation_warns_on_long_timeout_and_missing_dir() {
        let config = SandboxConfig {
            timeout_secs: 3600,
            python: default_python(),
            scratch_dir: Some(PathBuf::from("/definitely/not/a/dir")),
        };

        let warnings = config.validated().unwrap();
        assert_eq!(warnings.len(), 2);
    }
}
