use serde::{Deserialize, Serialize};

/// Top-level generator settings, stored as `forge.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub writer: WriterConfig,
    pub logging: LoggingConfig,
}

/// Settings that shape the command tree and the render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Deepest nesting accepted by the tree builder
    pub max_depth: usize,
    /// Paths longer than this get an abbreviated canonical hook name
    pub hook_threshold: usize,
    /// Targets rendered when none are given on the command line
    pub targets: Vec<String>,
    pub output_dir: String,
    /// Render targets concurrently
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            hook_threshold: 3,
            targets: vec!["python".to_string()],
            output_dir: "generated".to_string(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Move a differing existing file to `<file>.bak` before overwriting
    pub backup: bool,
    pub dry_run: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Daily rolling log file; console only when unset
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Accepted tracing levels for `logging.level`
    pub const LOG_LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];
}
