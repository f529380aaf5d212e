//! Renderer capability trait
//!
//! A renderer turns an [`Ir`] into in-memory artifacts for one target
//! language. The default [`Renderer::render`] drives the shared pipeline:
//! templates are registered, the command tree is walked post-order through
//! [`Renderer::emit_command`], and [`Renderer::compose`] turns the fragments
//! into files. Renderers never touch the filesystem.

use super::artifact::Artifact;
use super::emitter;
use super::templates::TemplateEngine;
use crate::errors::AppResult;
use crate::hooks::{HookBinding, HookIndex, NamingConvention, DEFAULT_HOOK_THRESHOLD};
use crate::ir::{CommandNode, Ir, DEFAULT_MAX_DEPTH};
use handlebars::HelperDef;
use indexmap::IndexMap;
use serde_json::Value;

/// Knobs for one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub hook_threshold: usize,
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hook_threshold: DEFAULT_HOOK_THRESHOLD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A custom handlebars helper contributed by a renderer
pub type CustomFilter = (&'static str, Box<dyn HelperDef + Send + Sync>);

/// Generated code for one command node, split into named sections.
///
/// A node's fragment already contains its children's code, so the fragments
/// of the top-level commands hold the whole tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub path: Vec<String>,
    sections: IndexMap<&'static str, String>,
}

impl Fragment {
    pub fn new(path: Vec<String>) -> Self {
        Self {
            path,
            sections: IndexMap::new(),
        }
    }

    /// Append code to a section, creating it on first use
    pub fn push(&mut self, section: &'static str, code: &str) {
        if code.is_empty() {
            return;
        }
        self.sections.entry(section).or_default().push_str(code);
    }

    pub fn with(mut self, section: &'static str, code: &str) -> Self {
        self.push(section, code);
        self
    }

    /// Append every section of each child, in child order
    pub fn absorb(&mut self, children: &[Fragment]) {
        for child in children {
            for (section, code) in &child.sections {
                self.push(section, code);
            }
        }
    }

    pub fn section(&self, name: &str) -> &str {
        self.sections.get(name).map(String::as_str).unwrap_or("")
    }

    /// Concatenate one section across fragments
    pub fn join(fragments: &[Fragment], section: &str) -> String {
        fragments.iter().map(|f| f.section(section)).collect()
    }
}

/// Everything a renderer sees while emitting one target
pub struct EmitContext<'a> {
    pub target_id: &'static str,
    pub ir: &'a Ir,
    pub bindings: &'a HookIndex,
    pub engine: &'a TemplateEngine,
    pub options: &'a RenderOptions,
    /// Result of [`Renderer::transform_context`]
    pub root: &'a Value,
}

/// The plugin interface every target implements
pub trait Renderer: Send + Sync {
    /// Stable identifier used on the command line and in the registry
    fn target_id(&self) -> &'static str;

    /// Human readable name, e.g. "Python (click)"
    fn display_name(&self) -> &'static str;

    /// How binding names are spelled in this target
    fn naming(&self) -> NamingConvention;

    /// Handlebars templates as `(name, source)` pairs
    fn templates(&self) -> Vec<(&'static str, &'static str)>;

    /// Extra handlebars helpers for this target's templates
    fn custom_filters(&self) -> Vec<CustomFilter> {
        Vec::new()
    }

    /// Root template context for the file templates
    fn transform_context(&self, ir: &Ir) -> Value;

    /// Component name to relative output path
    fn output_layout(&self, ir: &Ir) -> IndexMap<String, String>;

    /// Emit the fragment for one node; `children` are the already emitted
    /// fragments of its subcommands, in declaration order.
    fn emit_command(
        &self,
        ctx: &EmitContext<'_>,
        node: &CommandNode,
        binding: &HookBinding,
        children: Vec<Fragment>,
    ) -> AppResult<Fragment>;

    /// Turn the top-level fragments into artifacts
    fn compose(&self, ctx: &EmitContext<'_>, fragments: &[Fragment]) -> AppResult<Vec<Artifact>>;

    /// Render the whole target. Side-effect free.
    fn render(&self, ir: &Ir, options: &RenderOptions) -> AppResult<Vec<Artifact>> {
        emitter::render_target(self, ir, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_absorbs_children_in_order() {
        let first = Fragment::new(vec!["a".into()]).with("code", "a;");
        let second = Fragment::new(vec!["b".into()])
            .with("code", "b;")
            .with("stubs", "fn b() {}");
        let mut parent = Fragment::new(vec!["p".into()]).with("code", "p;");
        parent.absorb(&[first, second]);

        assert_eq!(parent.section("code"), "p;a;b;");
        assert_eq!(parent.section("stubs"), "fn b() {}");
        assert_eq!(parent.section("missing"), "");
    }

    #[test]
    fn test_fragment_join() {
        let fragments = vec![
            Fragment::new(vec![]).with("x", "1"),
            Fragment::new(vec![]),
            Fragment::new(vec![]).with("x", "2"),
        ];
        assert_eq!(Fragment::join(&fragments, "x"), "12");
    }
}
