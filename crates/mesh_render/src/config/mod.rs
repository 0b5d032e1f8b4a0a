//! Configuration system
//!
//! Configuration types load from TOML or RON files. Unknown keys are rejected
//! when a file is parsed, so a misspelled option fails loudly instead of
//! silently keeping its default.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error, including unknown keys
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Which mesh representations are snapshotted before compiling.
///
/// With both disabled the compiler reads the live core mesh every compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatherConfig {
    /// Snapshot the edit representation (default: false)
    pub edit: bool,
    /// Snapshot the core representation (default: false)
    pub core: bool,
}

impl GatherConfig {
    /// Gather both representations
    pub const fn both() -> Self {
        Self { edit: true, core: true }
    }

    /// True when neither representation is gathered
    pub const fn is_disabled(&self) -> bool {
        !self.edit && !self.core
    }
}

/// How `draw` turns mesh state into pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStrategy {
    /// Compile once per version and replay the draw list
    #[default]
    Cached,
    /// Rebuild and execute the full sequence every frame
    AlwaysDirty,
}

/// Settings shared by every render object created through one cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderCacheConfig {
    /// Representations to snapshot
    pub gather: GatherConfig,
    /// Replay strategy (default: cached)
    pub replay: ReplayStrategy,
    /// Worker threads for gathering; 0 gathers on the calling thread (default: 0)
    pub worker_threads: usize,
}

impl Default for RenderCacheConfig {
    fn default() -> Self {
        Self {
            gather: GatherConfig::default(),
            replay: ReplayStrategy::Cached,
            worker_threads: 0,
        }
    }
}

impl RenderCacheConfig {
    /// Set the gather configuration
    pub fn with_gather(mut self, gather: GatherConfig) -> Self {
        self.gather = gather;
        self
    }

    /// Set the replay strategy
    pub fn with_replay(mut self, replay: ReplayStrategy) -> Self {
        self.replay = replay;
        self
    }

    /// Set the number of gather worker threads
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }
}

impl Config for RenderCacheConfig {}
