//! Daemon configuration loaded from `config.toml`.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration.

use crate::error::{Error, Result};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for the search daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub debounce: DebounceConfig,
    pub results: ResultsConfig,
    pub engines: EngineConfig,
    pub translator: TranslatorConfig,
    pub filename: FileNameConfig,
}

/// The `[debounce]` section: how long a run waits for input to settle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Total settle time before translation starts.
    pub total_ms: u64,
    /// Length of one wait slice; cancellation is checked between slices.
    pub slice_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            total_ms: 2000,
            slice_ms: 200,
        }
    }
}

impl DebounceConfig {
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    pub fn slice(&self) -> Duration {
        Duration::from_millis(self.slice_ms)
    }
}

/// The `[results]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Cap applied to every category after ranking.
    pub max_per_category: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            max_per_category: 100,
        }
    }
}

/// The `[engines]` section: which backends take part in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub semantic: bool,
    pub vector: bool,
    pub fulltext: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            semantic: true,
            vector: true,
            fulltext: true,
        }
    }
}

/// The `[translator]` section: the external query-language service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Base URL of the service. Unset means translation is unreachable.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

/// The `[filename]` section: roots walked by the filename backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNameConfig {
    pub roots: Vec<PathBuf>,
    /// Stop walking after this many matches.
    pub max_matches: usize,
    /// Include hidden files and directories.
    pub hidden: bool,
}

impl Default for FileNameConfig {
    fn default() -> Self {
        Self {
            roots: dirs::home_dir().into_iter().collect(),
            max_matches: 1000,
            hidden: false,
        }
    }
}

impl DaemonConfig {
    /// Default location: `<config_dir>/deepsearch/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deepsearch").join("config.toml"))
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: DaemonConfig =
            toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit path, else the default path if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce.slice_ms == 0 {
            return Err(Error::Config("debounce.slice_ms must be positive".into()));
        }
        if self.debounce.slice_ms > self.debounce.total_ms {
            return Err(Error::Config(format!(
                "debounce.slice_ms ({}) exceeds debounce.total_ms ({})",
                self.debounce.slice_ms, self.debounce.total_ms
            )));
        }
        if self.results.max_per_category == 0 {
            return Err(Error::Config(
                "results.max_per_category must be positive".into(),
            ));
        }
        Ok(())
    }
}
