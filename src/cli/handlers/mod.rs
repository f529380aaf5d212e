//! Command handlers for all CLI operations
//!
//! This module routes parsed commands to the handler owning them, keeping
//! clap parsing apart from the generation core.

pub mod config;
pub mod generate;
pub mod inspect;
pub mod traits;

use super::{CliContext, Commands};
use anyhow::Result;
use config::ConfigHandler;
use generate::{GenerateHandler, GenerateRequest};
use inspect::{InspectHandler, TargetsHandler};
use traits::HandlerBuilder;

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    /// Create a new command handler instance with the provided context
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        let builder = HandlerBuilder::new(&self.context);
        match command {
            Commands::Generate {
                input,
                targets,
                output,
                dry_run,
                sequential,
            } => {
                builder
                    .build::<GenerateHandler>()
                    .handle_generate(GenerateRequest {
                        input,
                        targets,
                        output,
                        dry_run,
                        sequential,
                    })
                    .await
            }
            Commands::Validate { input } => {
                builder
                    .build::<InspectHandler>()
                    .handle_validate(&input)
                    .await
            }
            Commands::Hooks { input, target } => {
                builder
                    .build::<InspectHandler>()
                    .handle_hooks(&input, target.as_deref())
                    .await
            }
            Commands::Targets => {
                builder
                    .build::<TargetsHandler>()
                    .handle_targets()
                    .await
            }
            Commands::Init { global, force } => {
                builder
                    .build::<ConfigHandler>()
                    .handle_init(global, force)
                    .await
            }
            Commands::Config { action } => {
                builder
                    .build::<ConfigHandler>()
                    .handle_config(action)
                    .await
            }
        }
    }
}
