//! Recursive command emission
//!
//! Walks the command tree depth-first with an explicit stack and asks the
//! renderer for one fragment per node. Children are emitted before their
//! parent finalizes, so every fragment embeds its subtree. Any failure aborts
//! the target and nothing emitted so far is kept.

use super::assembler;
use super::artifact::Artifact;
use super::templates::TemplateEngine;
use super::traits::{EmitContext, Fragment, RenderOptions, Renderer};
use crate::errors::{AppError, AppResult};
use crate::hooks::{HookIndex, HookResolver};
use crate::ir::{CommandNode, Ir};
use tracing::debug;

enum Visit<'a> {
    Enter(&'a CommandNode),
    Exit(&'a CommandNode),
}

/// Fragments for the top-level commands plus the number of nodes visited
#[derive(Debug)]
pub struct Emission {
    pub fragments: Vec<Fragment>,
    pub visited: usize,
}

/// Post-order walk of the whole tree through `renderer`.
///
/// Siblings are visited in declaration order. Nodes at or beyond
/// `options.max_depth` fail with `DepthLimitExceeded`.
pub fn emit_tree<R: Renderer + ?Sized>(renderer: &R, ctx: &EmitContext<'_>) -> AppResult<Emission> {
    let target = renderer.target_id();
    let mut stack: Vec<Visit<'_>> = ctx.ir.commands.values().rev().map(Visit::Enter).collect();
    // One collector per open node; the bottom one gathers top-level fragments
    let mut collectors: Vec<Vec<Fragment>> = vec![Vec::new()];
    let mut visited = 0usize;

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => {
                if node.depth >= ctx.options.max_depth {
                    return Err(AppError::DepthLimitExceeded {
                        path: node.path(),
                        limit: ctx.options.max_depth,
                    });
                }
                stack.push(Visit::Exit(node));
                stack.extend(node.subcommands.values().rev().map(Visit::Enter));
                collectors.push(Vec::new());
            }
            Visit::Exit(node) => {
                let path = node.path();
                let children = collectors
                    .pop()
                    .ok_or_else(|| AppError::internal("emitter collector stack underflow"))?;
                let binding = ctx.bindings.get(&path).ok_or_else(|| {
                    AppError::render(target, &path, "no hook binding computed for command")
                })?;
                let fragment = renderer
                    .emit_command(ctx, node, binding, children)
                    .map_err(|e| e.into_render(target, &path))?;
                debug!(target_id = target, path = %path.join(" "), "emitted command");
                collectors
                    .last_mut()
                    .ok_or_else(|| AppError::internal("emitter collector stack underflow"))?
                    .push(fragment);
                visited += 1;
            }
        }
    }

    let fragments = collectors
        .pop()
        .ok_or_else(|| AppError::internal("emitter collector stack underflow"))?;
    Ok(Emission { fragments, visited })
}

/// The full render pipeline for one target: bindings, templates, emission,
/// composition and assembly.
pub fn render_target<R: Renderer + ?Sized>(
    renderer: &R,
    ir: &Ir,
    options: &RenderOptions,
) -> AppResult<Vec<Artifact>> {
    let target = renderer.target_id();
    let root_path: &[String] = &[];

    let engine = TemplateEngine::for_renderer(renderer).map_err(|e| e.into_render(target, root_path))?;
    let resolver = HookResolver::new(renderer.naming(), options.hook_threshold);
    let bindings = HookIndex::build(ir, &resolver)?;
    let root = renderer.transform_context(ir);

    let ctx = EmitContext {
        target_id: target,
        ir,
        bindings: &bindings,
        engine: &engine,
        options,
        root: &root,
    };

    let emission = emit_tree(renderer, &ctx)?;
    if emission.visited != ir.node_count() {
        return Err(AppError::render(
            target,
            root_path,
            format!(
                "emitted {} of {} commands",
                emission.visited,
                ir.node_count()
            ),
        ));
    }
    debug!(target_id = target, visited = emission.visited, "command tree emitted");

    let artifacts = renderer
        .compose(&ctx, &emission.fragments)
        .map_err(|e| e.into_render(target, root_path))?;
    assembler::assemble(target, artifacts)
}
