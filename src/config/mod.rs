use crate::errors::{AppError, AppResult};
use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

mod types;

pub use types::{Config, GenerationConfig, LoggingConfig, WriterConfig};

/// Directory holding `forge.toml`, both per project and in the home directory
const CONFIG_DIR: &str = ".cli-forge";
const CONFIG_FILE: &str = "forge.toml";

/// Where the active configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    Project,
    Global,
    Defaults,
}

/// Configuration manager for cli-forge
///
/// # Configuration Hierarchy
///
/// 1. **Explicit**: a path passed with `--config`
/// 2. **Project-level**: `.cli-forge/forge.toml` in the project root
/// 3. **Global**: `~/.cli-forge/forge.toml` in the user home directory
/// 4. **Defaults**: built in; nothing is written until [`save`](Self::save)
///
/// # Example
///
/// ```rust,no_run
/// use cli_forge::config::ConfigManager;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConfigManager::load(Some(Path::new("/path/to/project")), None)?;
///     println!("max depth: {}", manager.config().generation.max_depth);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
    source: ConfigSource,
}

impl ConfigManager {
    /// Dotted keys understood by [`get`](Self::get) and [`set`](Self::set)
    pub const KEYS: [&'static str; 9] = [
        "generation.max_depth",
        "generation.hook_threshold",
        "generation.targets",
        "generation.output_dir",
        "generation.parallel",
        "writer.backup",
        "writer.dry_run",
        "logging.level",
        "logging.file",
    ];

    /// Resolve and load the active configuration.
    ///
    /// An explicit path must exist. Otherwise the project file wins over the
    /// global one, and built-in defaults are used when neither exists. When
    /// falling back to defaults the manager points at the project location (or
    /// the global one without a project) so a later `save` lands there.
    pub fn load(project_path: Option<&Path>, explicit: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AppError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path, ConfigSource::Explicit);
        }

        if let Some(project) = project_path {
            let project_config = Self::config_path(Some(project))?;
            if project_config.exists() {
                return Self::from_file(&project_config, ConfigSource::Project);
            }
        }

        // No home directory is not fatal for lookup, only for writing there
        if let Ok(global_config) = Self::config_path(None) {
            if global_config.exists() {
                return Self::from_file(&global_config, ConfigSource::Global);
            }
        }

        let config_path = Self::config_path(project_path)?;
        debug!(path = %config_path.display(), "no configuration file found, using defaults");
        Ok(Self {
            config_path,
            config: Config::default(),
            source: ConfigSource::Defaults,
        })
    }

    /// A manager with default settings bound to the project or global path,
    /// used by `init`.
    pub fn with_defaults(project_path: Option<&Path>) -> AppResult<Self> {
        Ok(Self {
            config_path: Self::config_path(project_path)?,
            config: Config::default(),
            source: ConfigSource::Defaults,
        })
    }

    /// Location of `forge.toml` for a project, or the global one for `None`
    pub fn config_path(project_path: Option<&Path>) -> AppResult<PathBuf> {
        let base_path = match project_path {
            Some(path) => path.join(CONFIG_DIR),
            None => {
                let base_dirs = BaseDirs::new()
                    .ok_or_else(|| AppError::config("Failed to get base directories"))?;
                base_dirs.home_dir().join(CONFIG_DIR)
            }
        };
        Ok(base_path.join(CONFIG_FILE))
    }

    fn from_file(path: &Path, source: ConfigSource) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::config_with_source("Failed to parse config file", e))?;
        Self::validate(&config)?;
        debug!(path = %path.display(), ?source, "loaded configuration");
        Ok(Self {
            config_path: path.to_path_buf(),
            config,
            source,
        })
    }

    fn validate(config: &Config) -> AppResult<()> {
        let generation = &config.generation;
        if generation.max_depth == 0 {
            return Err(AppError::InvalidConfigValue {
                key: "generation.max_depth".into(),
                value: "0".into(),
            });
        }
        if generation.hook_threshold == 0 {
            return Err(AppError::InvalidConfigValue {
                key: "generation.hook_threshold".into(),
                value: "0".into(),
            });
        }
        if !Config::LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(AppError::InvalidConfigValue {
                key: "logging.level".into(),
                value: config.logging.level.clone(),
            });
        }
        Ok(())
    }

    /// Saves the current configuration to the path it is bound to
    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io_with_source(parent, "create config directory", e))?;
        }
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| AppError::config_with_source("Failed to serialize config", e))?;
        fs::write(&self.config_path, content)
            .map_err(|e| AppError::io_with_source(&self.config_path, "write config file", e))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// After modifying the configuration, call [`save()`](Self::save) to persist changes.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Read one setting by dotted key
    pub fn get(&self, key: &str) -> AppResult<String> {
        let c = &self.config;
        let value = match key {
            "generation.max_depth" => c.generation.max_depth.to_string(),
            "generation.hook_threshold" => c.generation.hook_threshold.to_string(),
            "generation.targets" => c.generation.targets.join(","),
            "generation.output_dir" => c.generation.output_dir.clone(),
            "generation.parallel" => c.generation.parallel.to_string(),
            "writer.backup" => c.writer.backup.to_string(),
            "writer.dry_run" => c.writer.dry_run.to_string(),
            "logging.level" => c.logging.level.clone(),
            "logging.file" => c.logging.file.clone().unwrap_or_else(|| "None".to_string()),
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        };
        Ok(value)
    }

    /// Update one setting by dotted key. Values are validated but not saved.
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        let invalid = || AppError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let c = &mut self.config;
        match key {
            "generation.max_depth" => {
                c.generation.max_depth = value.parse::<usize>().ok().filter(|d| *d > 0).ok_or_else(invalid)?
            }
            "generation.hook_threshold" => {
                c.generation.hook_threshold =
                    value.parse::<usize>().ok().filter(|t| *t > 0).ok_or_else(invalid)?
            }
            "generation.targets" => {
                let targets: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                if targets.is_empty() {
                    return Err(invalid());
                }
                c.generation.targets = targets;
            }
            "generation.output_dir" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                c.generation.output_dir = value.to_string();
            }
            "generation.parallel" => c.generation.parallel = value.parse().map_err(|_| invalid())?,
            "writer.backup" => c.writer.backup = value.parse().map_err(|_| invalid())?,
            "writer.dry_run" => c.writer.dry_run = value.parse().map_err(|_| invalid())?,
            "logging.level" => {
                let level = value.to_ascii_lowercase();
                if !Config::LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid());
                }
                c.logging.level = level;
            }
            "logging.file" => {
                c.logging.file = if value.is_empty() || value == "None" {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        }
        Ok(())
    }
}
