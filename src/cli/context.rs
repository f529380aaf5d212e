//! CLI Context for dependency injection and shared state
//!
//! This module provides the CliContext abstraction that centralizes
//! configuration management and reduces coupling in CLI handlers.

use crate::config::ConfigManager;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context with the specified project path, explicit
    /// configuration file and verbosity
    pub fn new(
        project_path: Option<PathBuf>,
        config_file: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self> {
        if let Some(path) = &project_path {
            if !path.is_dir() {
                return Err(anyhow!("Project path is not a directory: {}", path.display()));
            }
        }
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::load(
            resolved_project_path.as_deref(),
            config_file.as_deref(),
        )?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Auto-detect project path by looking for .cli-forge/forge.toml
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        if let Ok(current_dir) = std::env::current_dir() {
            if let Ok(config_path) = ConfigManager::config_path(Some(&current_dir)) {
                if config_path.exists() {
                    return Some(current_dir);
                }
            }
        }

        // No project config found, use global config
        None
    }

    /// Directory relative output paths are resolved against
    pub fn base_dir(&self) -> PathBuf {
        self.project_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Initialize logging subsystem based on verbosity and configuration.
    ///
    /// Console logs go to stderr. When `logging.file` is set, logs go to a
    /// daily rolling file instead, and the returned guard must be kept alive
    /// until the program exits so buffered lines are flushed.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let logging = &self.config_manager.config().logging;
        let log_level = if self.verbose {
            "debug"
        } else {
            logging.level.as_str()
        };
        let filter = || {
            EnvFilter::from_default_env().add_directive(
                log_level
                    .parse()
                    .unwrap_or_else(|_| tracing::Level::INFO.into()),
            )
        };

        let guard = match &logging.file {
            Some(file) => {
                let path = Path::new(file);
                let directory = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .ok_or_else(|| anyhow!("Invalid log file path: {file}"))?;
                let appender = tracing_appender::rolling::daily(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(writer)
                    .with_ansi(false)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
                Some(guard)
            }
            None => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
                None
            }
        };

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!(
                "Config path: {} ({:?})",
                self.config_manager.path().display(),
                self.config_manager.source()
            );
        }

        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;
    use tempfile::TempDir;

    #[test]
    fn test_context_creation() {
        let temp_dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(temp_dir.path().to_path_buf()), None, false).unwrap();

        assert_eq!(context.project_path, Some(temp_dir.path().to_path_buf()));
        assert!(!context.verbose);
        assert_eq!(context.config_manager.config().generation.max_depth, 16);
        assert_eq!(context.base_dir(), temp_dir.path().to_path_buf());
    }

    #[test]
    fn test_context_rejects_missing_project() {
        let non_existent = PathBuf::from("/this/path/does/not/exist");
        assert!(CliContext::new(Some(non_existent), None, false).is_err());
    }

    #[test]
    fn test_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("custom.toml");
        std::fs::write(&config_file, "[generation]\nhook_threshold = 5\n").unwrap();

        let context = CliContext::new(
            Some(temp_dir.path().to_path_buf()),
            Some(config_file),
            true,
        )
        .unwrap();
        assert!(context.verbose);
        assert_eq!(context.config_manager.source(), ConfigSource::Explicit);
        assert_eq!(context.config_manager.config().generation.hook_threshold, 5);

        let missing = CliContext::new(None, Some(temp_dir.path().join("nope.toml")), false);
        assert!(missing.is_err());
    }
}
