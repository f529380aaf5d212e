//! Generation orchestration
//!
//! One immutable command tree is rendered for every requested target,
//! concurrently when enabled. A failing target never affects the others, and
//! outcomes always come back in request order.

use crate::config::GenerationConfig;
use crate::errors::{AppError, AppResult};
use crate::ir::Ir;
use crate::render::{apply_merge_policy, Artifact, DiskExistingFiles, RenderOptions, RendererRegistry};
use crate::writer::{FileWriter, WriteReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Knobs for a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub render: RenderOptions,
    pub parallel: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            parallel: true,
        }
    }
}

impl GeneratorSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            render: RenderOptions {
                hook_threshold: config.hook_threshold,
                max_depth: config.max_depth,
            },
            parallel: config.parallel,
        }
    }
}

/// Result of rendering one target
#[derive(Debug)]
pub struct TargetOutcome {
    pub target_id: String,
    pub result: AppResult<Vec<Artifact>>,
}

impl TargetOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What happened to one target's files
#[derive(Debug, Clone, Default)]
pub struct WrittenTarget {
    pub directory: PathBuf,
    /// Create-if-absent artifacts left alone because the file exists
    pub skipped: Vec<String>,
    pub report: WriteReport,
}

/// Render and write result of one target
#[derive(Debug)]
pub struct TargetReport {
    pub target_id: String,
    pub result: AppResult<WrittenTarget>,
}

/// Drives renderers from the registry
#[derive(Debug, Clone)]
pub struct Generator {
    registry: Arc<RendererRegistry>,
    settings: GeneratorSettings,
}

impl Generator {
    pub fn new(registry: Arc<RendererRegistry>, settings: GeneratorSettings) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    /// Render one target synchronously
    pub fn render_target(&self, ir: &Ir, target_id: &str) -> AppResult<Vec<Artifact>> {
        render_one(&self.registry, ir, target_id, &self.settings.render)
    }

    /// Render every requested target.
    ///
    /// Returns one outcome per entry of `targets`, in the same order. Unknown
    /// targets yield `UnsupportedTarget` for that entry only.
    pub async fn generate(&self, ir: Arc<Ir>, targets: &[String]) -> Vec<TargetOutcome> {
        if !self.settings.parallel || targets.len() < 2 {
            return targets
                .iter()
                .map(|target_id| TargetOutcome {
                    target_id: target_id.clone(),
                    result: self.render_target(&ir, target_id),
                })
                .collect();
        }

        let handles: Vec<_> = targets
            .iter()
            .map(|target_id| {
                let registry = Arc::clone(&self.registry);
                let ir = Arc::clone(&ir);
                let options = self.settings.render.clone();
                let target = target_id.clone();
                tokio::task::spawn_blocking(move || render_one(&registry, &ir, &target, &options))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(targets.len());
        for (target_id, handle) in targets.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(AppError::render(
                    target_id,
                    &[],
                    format!("render task failed: {e}"),
                )),
            };
            outcomes.push(TargetOutcome {
                target_id: target_id.clone(),
                result,
            });
        }
        outcomes
    }

    /// Render, apply the merge policy and write each successful target below
    /// `output_root/<target>`. Failed targets write nothing.
    pub async fn generate_and_write(
        &self,
        ir: Arc<Ir>,
        targets: &[String],
        output_root: &Path,
        writer: &FileWriter,
    ) -> Vec<TargetReport> {
        let outcomes = self.generate(ir, targets).await;
        outcomes
            .into_iter()
            .map(|outcome| {
                let directory = output_root.join(&outcome.target_id);
                let result = outcome.result.and_then(|artifacts| {
                    let merged = apply_merge_policy(artifacts, &DiskExistingFiles::new(&directory));
                    let report = writer.write_all(&directory, &merged.artifacts)?;
                    Ok(WrittenTarget {
                        directory: directory.clone(),
                        skipped: merged.skipped,
                        report,
                    })
                });
                if let Err(e) = &result {
                    error!(target_id = %outcome.target_id, category = e.category(), "target not written: {e}");
                }
                TargetReport {
                    target_id: outcome.target_id,
                    result,
                }
            })
            .collect()
    }
}

fn render_one(
    registry: &RendererRegistry,
    ir: &Ir,
    target_id: &str,
    options: &RenderOptions,
) -> AppResult<Vec<Artifact>> {
    debug!(target_id, "rendering target");
    let result = registry
        .get(target_id)
        .and_then(|renderer| renderer.render(ir, options));
    match &result {
        Ok(artifacts) => info!(target_id, artifacts = artifacts.len(), "target rendered"),
        Err(e) => error!(target_id, category = e.category(), "target failed: {e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TreeBuilder;
    use serde_json::json;
    use tempfile::TempDir;

    fn ir() -> Arc<Ir> {
        let doc = json!({"name": "demo", "commands": {"hello": {"desc": "Say hello"}}});
        Arc::new(TreeBuilder::new().build(&doc).unwrap())
    }

    fn generator(parallel: bool) -> Generator {
        Generator::new(
            Arc::new(RendererRegistry::with_builtin()),
            GeneratorSettings {
                parallel,
                ..GeneratorSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_outcomes_in_request_order() {
        let targets: Vec<String> = ["rust", "cobol", "python", "nodejs"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for parallel in [true, false] {
            let outcomes = generator(parallel).generate(ir(), &targets).await;
            let ids: Vec<_> = outcomes.iter().map(|o| o.target_id.as_str()).collect();
            assert_eq!(ids, vec!["rust", "cobol", "python", "nodejs"]);
            assert!(outcomes[0].is_ok());
            assert!(matches!(
                outcomes[1].result,
                Err(AppError::UnsupportedTarget { .. })
            ));
            assert!(outcomes[2].is_ok());
            assert!(outcomes[3].is_ok());
        }
    }

    #[tokio::test]
    async fn test_generate_and_write_keeps_existing_hooks() {
        let dir = TempDir::new().unwrap();
        let targets = vec!["nodejs".to_string()];
        let generator = generator(true);
        let writer = FileWriter::default();

        let first = generator
            .generate_and_write(ir(), &targets, dir.path(), &writer)
            .await;
        let written = first[0].result.as_ref().unwrap();
        assert!(written.skipped.is_empty());
        let hooks = dir.path().join("nodejs/src/hooks.js");
        assert!(hooks.exists());

        std::fs::write(&hooks, "// mine").unwrap();
        let second = generator
            .generate_and_write(ir(), &targets, dir.path(), &writer)
            .await;
        let written = second[0].result.as_ref().unwrap();
        assert_eq!(written.skipped, vec!["src/hooks.js"]);
        assert_eq!(std::fs::read_to_string(&hooks).unwrap(), "// mine");
    }

    #[test]
    fn test_settings_from_config() {
        let config = GenerationConfig {
            hook_threshold: 5,
            max_depth: 8,
            parallel: false,
            ..GenerationConfig::default()
        };
        let settings = GeneratorSettings::from_config(&config);
        assert_eq!(settings.render.hook_threshold, 5);
        assert_eq!(settings.render.max_depth, 8);
        assert!(!settings.parallel);
    }
}
