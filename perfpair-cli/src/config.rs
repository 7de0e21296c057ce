//! Configuration loading from perfpair.toml
//!
//! Configuration can be specified in a `perfpair.toml` file in the project root.
//! The file is discovered by walking up from the current directory. Every
//! field has a default, so running without a file behaves exactly like
//! running with an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the configuration file looked for during discovery
pub const CONFIG_FILE: &str = "perfpair.toml";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Unrecognized output format name
    #[error("unknown output format '{0}' (expected \"human\" or \"json\")")]
    UnknownFormat(String),
}

/// perfpair configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerfConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Optional capability configuration
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
}

/// Runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Pin the runner thread to this CPU (Linux only)
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console text
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Optional capability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    /// Detection model weights
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Capabilities forced unavailable
    #[serde(default)]
    pub disable: Vec<String>,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            disable: Vec::new(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(perfpair_suites::DEFAULT_MODEL_PATH)
}

impl PerfConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Walk up from `start` looking for `perfpair.toml`
    pub fn find_from(start: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration from the current directory upwards.
    ///
    /// Returns `Ok(None)` when there is no file anywhere up the tree.
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        let Ok(cwd) = std::env::current_dir() else {
            return Ok(None);
        };
        match Self::find_from(cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        format!(
            r#"# perfpair configuration

[runner]
# Pin the runner thread to one CPU for steadier timings (Linux only)
# pin_cpu = 0

[output]
# Report format: "human" or "json"
format = "human"

[capabilities]
# Detection model weights used by the model loading group
model_path = "{}"
# Capabilities to treat as unavailable, e.g. ["image-library"]
disable = []
"#,
            perfpair_suites::DEFAULT_MODEL_PATH
        )
    }
}
