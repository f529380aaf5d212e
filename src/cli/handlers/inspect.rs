//! Read-only inspection commands: `validate`, `hooks` and `targets`

use super::super::CliContext;
use super::traits::{context_handler, ContextHandler};
use crate::hooks::{HookBinding, HookIndex, HookResolver};
use crate::render::RendererRegistry;
use anyhow::{Context, Result};
use std::path::Path;

/// Handler for commands that inspect a CLI description
pub struct InspectHandler<'a> {
    context: &'a CliContext,
}

context_handler!(InspectHandler);

impl InspectHandler<'_> {
    /// Build the tree, check every target can bind its hooks, and summarise it
    pub async fn handle_validate(&self, input: &Path) -> Result<()> {
        let ir = self.load_tree(input)?;
        let threshold = self.context.config_manager.config().generation.hook_threshold;
        let registry = RendererRegistry::with_builtin();
        for target_id in registry.available_targets() {
            let resolver = HookResolver::new(registry.get(&target_id)?.naming(), threshold);
            HookIndex::build(&ir, &resolver)
                .with_context(|| format!("Hook names clash for target '{target_id}'"))?;
        }

        println!("✓ {} {} is valid", ir.cli_name, ir.version);
        println!("  commands:       {}", ir.node_count());
        println!("  top-level:      {}", ir.commands.len());
        println!("  max depth:      {}", ir.max_depth());
        println!("  global options: {}", ir.global_options.len());
        let managed = ir.walk().iter().filter(|n| n.lifecycle.is_managed()).count();
        if managed > 0 {
            println!("  managed:        {managed}");
        }
        Ok(())
    }

    /// Print the binding names every command looks up, in lookup order
    pub async fn handle_hooks(&self, input: &Path, target: Option<&str>) -> Result<()> {
        let target_id = self.target_or_default(target);
        let renderer = RendererRegistry::with_builtin().get(&target_id)?;

        let ir = self.load_tree(input)?;
        let threshold = self.context.config_manager.config().generation.hook_threshold;
        let resolver = HookResolver::new(renderer.naming(), threshold);
        let index = HookIndex::build(&ir, &resolver)?;

        println!("Hook bindings for {} ({}):", ir.cli_name, renderer.display_name());
        for binding in index.iter() {
            print_binding(binding);
        }
        Ok(())
    }
}

fn print_binding(binding: &HookBinding) {
    let indent = "  ".repeat(binding.command_path.len());
    let name = binding.command_path.join(" ");
    match &binding.controller {
        None => {
            println!("{indent}{name} → {}", binding.canonical_name);
            println!("{indent}  lookup: {}", binding.candidate_names.join(", "));
        }
        Some(controller) => {
            println!("{indent}{name} [managed] → {}", controller.canonical_name);
            println!("{indent}  controllers: {}", controller.candidate_names.join(", "));
            for action in &controller.actions {
                println!(
                    "{indent}  {}: {}",
                    action.action,
                    action.candidate_names.join(", ")
                );
            }
        }
    }
}

/// Handler listing the registered targets
pub struct TargetsHandler<'a> {
    context: &'a CliContext,
}

context_handler!(TargetsHandler);

impl TargetsHandler<'_> {
    pub async fn handle_targets(&self) -> Result<()> {
        let registry = RendererRegistry::with_builtin();
        let default_target = self.target_or_default(None);
        println!("Available targets:");
        for target_id in registry.available_targets() {
            let renderer = registry.get(&target_id)?;
            let marker = if target_id == default_target { " (default)" } else { "" };
            println!("  {target_id:<12} {}{marker}", renderer.display_name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_reports_schema_errors() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let handler = InspectHandler::from_context(&context);

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"name": "demo", "commands": {"hello": {"desc": "Hi"}}}"#).unwrap();
        assert!(handler.handle_validate(&good).await.is_ok());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"name": "demo", "commands": {"hello": {}}}"#).unwrap();
        let err = handler.handle_validate(&bad).await.unwrap_err();
        assert!(format!("{err:#}").contains("hello"));
    }

    #[tokio::test]
    async fn test_hooks_rejects_unknown_target() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let input = dir.path().join("cli.json");
        std::fs::write(&input, r#"{"name": "demo", "commands": {"hello": {"desc": "Hi"}}}"#).unwrap();

        let handler = InspectHandler::from_context(&context);
        assert!(handler.handle_hooks(&input, Some("rust")).await.is_ok());
        assert!(handler.handle_hooks(&input, Some("cobol")).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_rejects_hook_names_joined_across_branches() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap();
        let input = dir.path().join("cli.json");
        std::fs::write(
            &input,
            r#"{"name": "demo", "commands": {
                "a-b": {"desc": "top"},
                "a": {"desc": "a", "subcommands": {"b": {"desc": "nested"}}}
            }}"#,
        )
        .unwrap();

        let handler = InspectHandler::from_context(&context);
        let err = handler.handle_validate(&input).await.unwrap_err();
        assert!(format!("{err:#}").contains("'a-b' and 'a b'"));
        assert!(handler.handle_hooks(&input, Some("nodejs")).await.is_err());
    }
}
