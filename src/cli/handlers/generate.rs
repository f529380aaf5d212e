//! Generation handler
//!
//! Builds the command tree once, renders every requested target and writes
//! each into its own subdirectory of the output root.

use super::super::CliContext;
use super::traits::{context_handler, ContextHandler};
use crate::errors::display_path;
use crate::generator::{Generator, GeneratorSettings, TargetReport};
use crate::render::RendererRegistry;
use crate::writer::FileWriter;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Arguments of `cli-forge generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub input: PathBuf,
    pub targets: Vec<String>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    pub sequential: bool,
}

/// Handler for code generation
pub struct GenerateHandler<'a> {
    context: &'a CliContext,
}

context_handler!(GenerateHandler);

impl GenerateHandler<'_> {
    /// Handle `generate`; fails when any requested target failed
    pub async fn handle_generate(&self, request: GenerateRequest) -> Result<()> {
        let config = self.context.config_manager.config();

        let targets = self.resolve_targets(&request.targets)?;
        let output_root = self.resolve_output(request.output.as_deref());

        let ir = self.load_tree(&request.input)?;
        info!(
            cli = %ir.cli_name,
            nodes = ir.node_count(),
            targets = targets.len(),
            "command tree built"
        );

        let mut settings = GeneratorSettings::from_config(&config.generation);
        if request.sequential {
            settings.parallel = false;
        }
        let writer = FileWriter::new(config.writer.backup, request.dry_run || config.writer.dry_run);
        debug!(output = %output_root.display(), dry_run = writer.is_dry_run(), "writing artifacts");

        let generator = Generator::new(Arc::new(RendererRegistry::with_builtin()), settings);
        let reports = generator
            .generate_and_write(Arc::new(ir), &targets, &output_root, &writer)
            .await;

        let failed = Self::print_reports(&reports, writer.is_dry_run());
        if failed > 0 {
            bail!("{failed} of {} targets failed", reports.len());
        }
        Ok(())
    }

    /// Requested targets in order without repeats, or the configured defaults
    fn resolve_targets(&self, requested: &[String]) -> Result<Vec<String>> {
        let source: &[String] = if requested.is_empty() {
            &self.context.config_manager.config().generation.targets
        } else {
            requested
        };
        let mut targets: Vec<String> = Vec::with_capacity(source.len());
        for target in source {
            if !targets.contains(target) {
                targets.push(target.clone());
            }
        }
        if targets.is_empty() {
            bail!("No targets requested. Use --target or set generation.targets");
        }
        Ok(targets)
    }

    fn resolve_output(&self, output: Option<&Path>) -> PathBuf {
        match output {
            Some(path) => path.to_path_buf(),
            None => self
                .context
                .base_dir()
                .join(&self.context.config_manager.config().generation.output_dir),
        }
    }

    /// Print one line per target and return how many failed
    fn print_reports(reports: &[TargetReport], dry_run: bool) -> usize {
        let mut failed = 0;
        for report in reports {
            match &report.result {
                Ok(written) => {
                    let verb = if dry_run { "would write" } else { "written" };
                    println!(
                        "✓ {} → {} ({} {verb}, {} unchanged, {} kept)",
                        report.target_id,
                        written.directory.display(),
                        written.report.written.len(),
                        written.report.unchanged.len(),
                        written.skipped.len(),
                    );
                    if dry_run {
                        for path in &written.report.written {
                            println!("    {}", path.display());
                        }
                    }
                }
                Err(e) => {
                    failed += 1;
                    println!("✗ {}: {e}", report.target_id);
                    if e.is_fatal_for_run() {
                        println!("    nothing was rendered for this target");
                    } else if let Some(path) = e.command_path() {
                        println!("    failing command: {}", display_path(path));
                    }
                }
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> CliContext {
        CliContext::new(Some(dir.path().to_path_buf()), None, false).unwrap()
    }

    #[test]
    fn test_resolve_targets_dedupes_and_defaults() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);
        let handler = GenerateHandler::from_context(&context);

        let requested = vec!["rust".to_string(), "python".to_string(), "rust".to_string()];
        assert_eq!(handler.resolve_targets(&requested).unwrap(), vec!["rust", "python"]);

        let defaults = handler.resolve_targets(&[]).unwrap();
        assert_eq!(defaults, context.config_manager.config().generation.targets);
    }

    #[test]
    fn test_output_defaults_below_project() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);
        let handler = GenerateHandler::from_context(&context);

        let output_dir = &context.config_manager.config().generation.output_dir;
        assert_eq!(handler.resolve_output(None), dir.path().join(output_dir));
        assert_eq!(handler.resolve_output(Some(Path::new("/tmp/x"))), PathBuf::from("/tmp/x"));
    }

    #[tokio::test]
    async fn test_generate_writes_each_target() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("cli.yaml");
        std::fs::write(&input, "name: demo\ncommands:\n  hello:\n    desc: Say hello\n").unwrap();
        let context = context(&dir);

        GenerateHandler::from_context(&context)
            .handle_generate(GenerateRequest {
                input,
                targets: vec!["python".into(), "rust".into()],
                output: Some(dir.path().join("out")),
                ..GenerateRequest::default()
            })
            .await
            .unwrap();

        assert!(dir.path().join("out/python/pyproject.toml").exists());
        assert!(dir.path().join("out/rust/Cargo.toml").exists());
    }

    #[tokio::test]
    async fn test_unknown_target_fails_run_but_writes_others() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("cli.yaml");
        std::fs::write(&input, "name: demo\ncommands:\n  hello:\n    desc: Say hello\n").unwrap();
        let context = context(&dir);

        let result = GenerateHandler::from_context(&context)
            .handle_generate(GenerateRequest {
                input,
                targets: vec!["cobol".into(), "nodejs".into()],
                output: Some(dir.path().join("out")),
                ..GenerateRequest::default()
            })
            .await;

        assert!(result.is_err());
        assert!(dir.path().join("out/nodejs/package.json").exists());
        assert!(!dir.path().join("out/cobol").exists());
    }
}
