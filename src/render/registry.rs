use super::targets;
use super::traits::Renderer;
use crate::errors::{AppError, AppResult};
use indexmap::IndexMap;

/// Constructor for a renderer
pub type RendererFactory = fn() -> Box<dyn Renderer>;

/// Explicit mapping from target identifier to renderer constructor.
///
/// Built once at startup and shared read-only afterwards; registration needs
/// `&mut self`, so a registry behind an `Arc` cannot change during a run.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    factories: IndexMap<String, RendererFactory>,
}

impl RendererRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in target
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("python", targets::python::factory);
        registry.register("nodejs", targets::nodejs::factory);
        registry.register("typescript", targets::typescript::factory);
        registry.register("rust", targets::rust::factory);
        registry
    }

    /// Add or replace a target
    pub fn register(&mut self, target_id: impl Into<String>, factory: RendererFactory) {
        self.factories.insert(target_id.into(), factory);
    }

    pub fn has(&self, target_id: &str) -> bool {
        self.factories.contains_key(target_id)
    }

    /// A fresh renderer for `target_id`
    pub fn get(&self, target_id: &str) -> AppResult<Box<dyn Renderer>> {
        self.factories
            .get(target_id)
            .map(|factory| factory())
            .ok_or_else(|| AppError::UnsupportedTarget {
                target_id: target_id.to_string(),
                available: self.available_targets(),
            })
    }

    /// Registered identifiers in registration order
    pub fn available_targets(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("targets", &self.available_targets())
            .finish()
    }
}
