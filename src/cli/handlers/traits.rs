//! Shared plumbing for handlers
//!
//! Every handler borrows the `CliContext` for one command. The trait's
//! provided methods cover what several commands need from it: loading the
//! command tree under the configured depth ceiling and picking a target when
//! the user names none.

use super::super::CliContext;
use crate::ir::{self, Ir};
use anyhow::{Context, Result};
use std::path::Path;

/// Target whose naming is used when neither the command line nor the
/// configuration names one
pub const FALLBACK_TARGET: &str = "python";

/// A handler built from the context of the running command
pub trait ContextHandler<'a>: Sized {
    fn from_context(context: &'a CliContext) -> Self;

    fn context(&self) -> &'a CliContext;

    /// Build the command tree described by `input`
    fn load_tree(&self, input: &Path) -> Result<Ir> {
        let max_depth = self.context().config_manager.config().generation.max_depth;
        ir::build_from_file(input, max_depth)
            .with_context(|| format!("Invalid CLI description {}", input.display()))
    }

    /// `requested`, else the first configured target, else python
    fn target_or_default(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .or_else(|| {
                let config = self.context().config_manager.config();
                config.generation.targets.first().cloned()
            })
            .unwrap_or_else(|| FALLBACK_TARGET.to_string())
    }
}

/// Implement `ContextHandler` for a struct holding `context: &'a CliContext`
macro_rules! context_handler {
    ($handler:ident) => {
        impl<'a> crate::cli::handlers::traits::ContextHandler<'a> for $handler<'a> {
            fn from_context(context: &'a crate::cli::CliContext) -> Self {
                Self { context }
            }

            fn context(&self) -> &'a crate::cli::CliContext {
                self.context
            }
        }
    };
}

pub(crate) use context_handler;

/// Hands out handlers sharing one context
pub struct HandlerBuilder<'a> {
    context: &'a CliContext,
}

impl<'a> HandlerBuilder<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub fn build<H: ContextHandler<'a>>(&self) -> H {
        H::from_context(self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Bare<'a> {
        context: &'a CliContext,
    }

    context_handler!(Bare);

    #[test]
    fn test_target_or_default_prefers_request_then_config() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let handler: Bare = HandlerBuilder::new(&context).build();

        assert_eq!(handler.target_or_default(Some("rust")), "rust");
        let configured = context
            .config_manager
            .config()
            .generation
            .targets
            .first()
            .cloned()
            .unwrap_or_else(|| FALLBACK_TARGET.to_string());
        assert_eq!(handler.target_or_default(None), configured);
    }

    #[test]
    fn test_load_tree_names_the_input() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let handler: Bare = HandlerBuilder::new(&context).build();

        let input = dir.path().join("cli.json");
        std::fs::write(&input, r#"{"name": "demo", "commands": {"hello": {}}}"#).unwrap();
        let err = handler.load_tree(&input).unwrap_err();
        assert!(format!("{err:#}").contains("cli.json"));
    }
}
