//! Configuration management handler
//!
//! This module handles configuration initialization and reading or updating
//! single settings by dotted key.

use super::super::{CliContext, ConfigAction};
use super::traits::context_handler;
use crate::config::ConfigManager;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Handler for configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

context_handler!(ConfigHandler);

impl ConfigHandler<'_> {
    /// Handle configuration initialization
    pub async fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let path = if global {
            None
        } else {
            self.context
                .project_path
                .clone()
                .or_else(|| Some(PathBuf::from(".")))
        };

        let config_path = ConfigManager::config_path(path.as_deref())?;
        if config_path.exists() && !force {
            println!("Configuration already initialized at: {}", config_path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        ConfigManager::with_defaults(path.as_deref())?
            .save()
            .context("Failed to write configuration")?;
        println!("Configuration initialized successfully at: {}", config_path.display());
        println!();
        println!("Next steps:");
        println!("  cli-forge validate cli.yaml");
        println!("  cli-forge generate cli.yaml --target python");
        Ok(())
    }

    /// Handle configuration management
    pub async fn handle_config(&self, action: ConfigAction) -> Result<()> {
        // Work on a copy; the shared manager stays as loaded for this run
        let mut config_manager = (*self.context.config_manager).clone();

        match action {
            ConfigAction::Show => {
                println!(
                    "# {} ({:?})",
                    config_manager.path().display(),
                    config_manager.source()
                );
                println!("{}", toml::to_string_pretty(config_manager.config())?);
            }
            ConfigAction::Set { key, value } => {
                config_manager.set(&key, &value)?;
                config_manager.save()?;
                println!("Configuration updated: {key} = {value}");
            }
            ConfigAction::Get { key } => {
                println!("{}", config_manager.get(&key)?);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::handlers::traits::ContextHandler;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_set_persists() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let handler = ConfigHandler::from_context(&context);

        handler.handle_init(false, false).await.unwrap();
        let path = ConfigManager::config_path(Some(dir.path())).unwrap();
        assert!(path.exists());

        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        ConfigHandler::from_context(&context)
            .handle_config(ConfigAction::Set {
                key: "generation.hook_threshold".into(),
                value: "4".into(),
            })
            .await
            .unwrap();

        let reloaded = ConfigManager::load(Some(dir.path()), None).unwrap();
        assert_eq!(reloaded.config().generation.hook_threshold, 4);
    }

    #[tokio::test]
    async fn test_unknown_key_is_error() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let handler = ConfigHandler::from_context(&context);

        let result = handler
            .handle_config(ConfigAction::Get {
                key: "logging.color".into(),
            })
            .await;
        assert!(result.is_err());
    }
}
