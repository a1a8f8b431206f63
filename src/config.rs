//! Verifier configuration loaded from TOML and overridden from the command line

use crate::bundle::checks::Expectations;
use crate::bundle::layout::{DEFAULT_NODES_DIR, NodeSelection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "BUNDLE_VERIFY_CONFIG";
/// Environment variable naming the artifact root
pub const ARTIFACT_DIR_ENV_VAR: &str = "ARTIFACT_DIR";
/// Maximum accepted config file size in bytes
const MAX_CONFIG_FILE_SIZE: u64 = 256 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Read a TOML file no larger than the config size limit
pub fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    let size = std::fs::metadata(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?
        .len();
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid(format!(
            "{} exceeds {} bytes",
            path.display(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    std::fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
}

/// How content checks pick nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    First,
    #[default]
    Random,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Keep re-running the plan for at most this long; `None` runs once
    pub timeout_secs: Option<u64>,
    pub interval_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            interval_secs: 2,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub artifact_dir: Option<PathBuf>,
    /// Folder under the artifact root holding one folder per node
    pub nodes_dir: String,
    pub node_selection: SelectionMode,
    /// Seed for `random` selection
    pub seed: Option<u64>,
    pub expected_nodes: Option<usize>,
    /// Plan file replacing the built-in plan
    pub plan: Option<PathBuf>,
    pub expectations: Expectations,
    pub wait: WaitConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            nodes_dir: DEFAULT_NODES_DIR.to_string(),
            node_selection: SelectionMode::default(),
            seed: None,
            expected_nodes: None,
            plan: None,
            expectations: Expectations::default(),
            wait: WaitConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Load from `path`, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let config = Self::from_toml(&read_config_file(path)?)?;

        // Relative paths inside the file are relative to the file
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_relative_to(base))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.artifact_dir = self.artifact_dir.map(resolve);
        self.plan = self.plan.map(resolve);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("nodes_dir must not be empty".to_string()));
        }
        if self.expectations.metrics_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "expectations.metrics_file must not be empty".to_string(),
            ));
        }
        if !self.expectations.min_debian_version.is_finite()
            || self.expectations.min_debian_version < 0.0
        {
            return Err(ConfigError::Invalid(
                "expectations.min_debian_version must be a non-negative number".to_string(),
            ));
        }
        if self.wait.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "wait.interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn selection(&self) -> NodeSelection {
        match self.node_selection {
            SelectionMode::First => NodeSelection::First,
            SelectionMode::Random => NodeSelection::Random { seed: self.seed },
            SelectionMode::All => NodeSelection::All,
        }
    }

    pub fn artifact_dir(&self) -> Result<&Path, ConfigError> {
        self.artifact_dir.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "no artifact directory given (argument, {} or config)",
                ARTIFACT_DIR_ENV_VAR
            ))
        })
    }
}
