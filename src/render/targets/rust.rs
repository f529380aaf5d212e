//! Rust target: a clap builder-API binary crate. Hooks are plain functions
//! and controller types registered into a `HookRegistry` by `src/hooks.rs`.

use super::layout_path;
use crate::errors::AppResult;
use crate::hooks::{HookBinding, NamingConvention};
use crate::ir::{CommandNode, Ir};
use crate::render::artifact::{Artifact, ArtifactKind};
use crate::render::context::{extend, ContextBuilder};
use crate::render::traits::{CustomFilter, EmitContext, Fragment, Renderer};
use handlebars::handlebars_helper;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::HashSet;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
        "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
        "override", "priv", "try", "typeof", "unsized", "virtual", "yield", "invocation",
    ]
    .into_iter()
    .collect()
});

/// Value as the text clap parses it from
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rs_literal(value: &Value) -> String {
    format!("{:?}", as_text(value))
}

fn slice_of(items: &[Value]) -> String {
    format!(
        "[{}]",
        items.iter().map(rs_literal).collect::<Vec<_>>().join(", ")
    )
}

fn parser_of(param: &Value) -> String {
    if let Some(choices) = param["choices"].as_array() {
        return format!("PossibleValuesParser::new({})", slice_of(choices));
    }
    format!("value_parser!({})", type_of(param))
}

fn type_of(param: &Value) -> &'static str {
    if param["has_choices"].as_bool().unwrap_or(false) {
        return "String";
    }
    match param["type"].as_str() {
        Some("integer") => "i64",
        Some("float") => "f64",
        Some("boolean") => "bool",
        Some("path") => "std::path::PathBuf",
        _ => "String",
    }
}

fn default_call_of(param: &Value) -> String {
    if param["flag"].as_bool().unwrap_or(false) || param["default"].is_null() {
        return String::new();
    }
    format!("\n            .default_value({})", rs_literal(&param["default"]))
}

/// A version cargo accepts; anything that is not `x.y.z` falls back
fn crate_version(version: &str) -> String {
    let core = version.split(['-', '+']).next().unwrap_or_default();
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        version.to_string()
    } else {
        "0.1.0".to_string()
    }
}

handlebars_helper!(rs_str: |v: Json| rs_literal(v));
handlebars_helper!(rs_char: |s: str| format!("{:?}", s.chars().next().unwrap_or('?')));
handlebars_helper!(rs_slice: |items: array| slice_of(items));
handlebars_helper!(rs_parser: |param: Json| parser_of(param));
handlebars_helper!(rs_type: |param: Json| type_of(param));
handlebars_helper!(rs_default_call: |param: Json| default_call_of(param));

const ARGS: &str = r#"fn args_{{var}}() -> Vec<Arg> {
    vec![
{{#each arguments}}
        Arg::new({{rs_str key}})
            .value_name({{rs_str metavar}})
            .help({{rs_str description}})
            .required({{required}})
            .value_parser({{rs_parser this}}){{rs_default_call this}},
{{/each}}
{{#each options}}
        Arg::new({{rs_str key}})
            .long({{rs_str name}}){{#if short}}
            .short({{rs_char short}}){{/if}}
            .help({{rs_str description}})
            .env({{rs_str env}})
            .required({{required}}){{#if ../global}}
            .global(true){{/if}}
            {{#if flag}}.action(ArgAction::SetTrue){{else}}.value_parser({{rs_parser this}}){{/if}}{{rs_default_call this}},
{{/each}}
    ]
}

"#;

const COMMAND: &str = r#"fn {{var}}() -> Command {
    Command::new({{rs_str name}})
        .about({{rs_str help}})
        .hide({{hidden}}){{#if aliases}}
        .visible_aliases({{rs_slice aliases}}){{/if}}
        .args(args_{{var}}())
{{#each children}}
        .subcommand({{var}}())
{{/each}}
}

{{args}}fn run_{{var}}(reg: &HookRegistry, matches: &ArgMatches) -> HookResult {
{{#if is_group}}
    match matches.subcommand() {
{{#each children}}
        Some(({{rs_str name}}, sub)) => run_{{var}}(reg, sub),
{{/each}}
        _ => dispatch_group(reg, &{{rs_slice path}}, &{{rs_slice candidates}}, matches, {{var}}),
    }
{{else}}
    invoke(reg, &{{rs_slice path}}, &{{rs_slice candidates}}, matches)
{{/if}}
}

"#;

const MANAGED: &str = r#"fn {{var}}() -> Command {
    Command::new({{rs_str name}})
        .about({{rs_str help}})
        .hide({{hidden}}){{#if aliases}}
        .visible_aliases({{rs_slice aliases}}){{/if}}
{{#each actions}}
        .subcommand(Command::new({{rs_str action}}).about({{rs_str help}}).args(args_{{../var}}()))
{{/each}}
}

{{args}}fn run_{{var}}(reg: &HookRegistry, matches: &ArgMatches) -> HookResult {
    match matches.subcommand() {
{{#each actions}}
        Some(({{rs_str action}}, sub)) => run_managed(
            reg,
            &{{rs_slice ../path}},
            &{{rs_slice ../controller_candidates}},
            {{rs_str action}},
            &{{rs_slice candidates}},
            sub,
        ),
{{/each}}
        _ => print_help({{var}}()),
    }
}

"#;

const STUB_COMMAND: &str = r#"/// {{one_line description}}
pub fn {{canonical_name}}(invocation: &Invocation<'_>) -> HookResult {
{{#each arguments}}
    // let {{ident}}: Option<{{rs_type this}}> = invocation.value({{rs_str key}});
{{/each}}
{{#each options}}
    {{#if flag}}// let {{ident}} = invocation.flag({{rs_str key}});{{else}}// let {{ident}}: Option<{{rs_type this}}> = invocation.value({{rs_str key}});{{/if}}
{{/each}}
    println!("{}: not implemented yet", invocation.path.join(" "));
    Ok(())
}

"#;

const STUB_CONTROLLER: &str = r#"/// {{one_line description}}
pub struct {{controller}};

impl Controller for {{controller}} {
{{#each actions}}
    fn {{action}}(&self, invocation: &Invocation<'_>) -> HookResult {
        println!("{}: not implemented yet", invocation.path.join(" "));
        Ok(())
    }

{{/each}}
}

"#;

const MAIN: &str = r#"//! {{cli_name}} command-line interface.
//!
//! Generated by cli-forge. Do not edit this file; implement commands in
//! src/hooks.rs.

#![allow(dead_code, non_snake_case, unused_imports)]

mod hooks;

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::collections::HashMap;
use std::fmt;
use std::process::ExitCode;

pub type HookResult = Result<(), Box<dyn std::error::Error>>;

/// A command hook
pub type HookFn = fn(&Invocation<'_>) -> HookResult;

pub const GENERIC_HOOK: &str = {{rs_str generic}};

/// What a hook receives
pub struct Invocation<'a> {
    pub path: &'a [&'a str],
    pub matches: &'a ArgMatches,
}

impl Invocation<'_> {
    /// A parsed argument or option value
    pub fn value<T: Clone + Send + Sync + 'static>(&self, id: &str) -> Option<T> {
        self.matches.try_get_one::<T>(id).ok().flatten().cloned()
    }

    pub fn flag(&self, id: &str) -> bool {
        self.value::<bool>(id).unwrap_or(false)
    }
}

/// Lifecycle hooks of a managed command
pub trait Controller {
    fn start(&self, invocation: &Invocation<'_>) -> HookResult;
    fn stop(&self, invocation: &Invocation<'_>) -> HookResult;
    fn restart(&self, invocation: &Invocation<'_>) -> HookResult;
    fn status(&self, invocation: &Invocation<'_>) -> HookResult;
}

/// Hooks bound by name
#[derive(Default)]
pub struct HookRegistry {
    callables: HashMap<String, HookFn>,
    controllers: HashMap<String, Box<dyn Controller>>,
}

impl HookRegistry {
    pub fn callable(&mut self, name: &str, hook: HookFn) -> &mut Self {
        self.callables.insert(name.to_string(), hook);
        self
    }

    pub fn controller(&mut self, name: &str, controller: impl Controller + 'static) -> &mut Self {
        self.controllers.insert(name.to_string(), Box::new(controller));
        self
    }
}

/// No hook is bound for a command
#[derive(Debug)]
pub struct UnboundCommandError {
    pub path: Vec<String>,
    pub tried: Vec<String>,
}

impl fmt::Display for UnboundCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command '{}' is not bound (tried: {})",
            self.path.join(" "),
            self.tried.join(", ")
        )
    }
}

impl std::error::Error for UnboundCommandError {}

fn invoke(reg: &HookRegistry, path: &[&str], candidates: &[&str], matches: &ArgMatches) -> HookResult {
    let invocation = Invocation { path, matches };
    for name in candidates {
        if let Some(hook) = reg.callables.get(*name) {
            return hook(&invocation);
        }
    }
    Err(Box::new(UnboundCommandError {
        path: path.iter().map(|s| s.to_string()).collect(),
        tried: candidates.iter().map(|s| s.to_string()).collect(),
    }))
}

fn run_managed(
    reg: &HookRegistry,
    path: &[&str],
    controllers: &[&str],
    action: &str,
    candidates: &[&str],
    matches: &ArgMatches,
) -> HookResult {
    let mut full = path.to_vec();
    full.push(action);
    let invocation = Invocation { path: &full, matches };
    for name in controllers {
        if let Some(controller) = reg.controllers.get(*name) {
            return match action {
                "start" => controller.start(&invocation),
                "stop" => controller.stop(&invocation),
                "restart" => controller.restart(&invocation),
                _ => controller.status(&invocation),
            };
        }
    }
    invoke(reg, &full, candidates, matches)
}

fn dispatch_group(
    reg: &HookRegistry,
    path: &[&str],
    candidates: &[&str],
    matches: &ArgMatches,
    builder: fn() -> Command,
) -> HookResult {
    for name in candidates {
        if *name != GENERIC_HOOK && reg.callables.contains_key(*name) {
            return invoke(reg, path, &[*name], matches);
        }
    }
    print_help(builder())
}

fn print_help(mut command: Command) -> HookResult {
    command.print_help()?;
    println!();
    Ok(())
}

{{global_args}}fn cli() -> Command {
    Command::new({{rs_str cli_name}})
        .version({{rs_str version}})
        .about({{rs_str description}})
        .args(args_global())
{{#each commands}}
        .subcommand({{var}}())
{{/each}}
}

{{commands_code}}fn main() -> ExitCode {
    let matches = cli().get_matches();
    let mut registry = HookRegistry::default();
    hooks::register(&mut registry);

    let result = match matches.subcommand() {
{{#each commands}}
        Some(({{rs_str name}}, sub)) => run_{{var}}(&registry, sub),
{{/each}}
        _ => print_help(cli()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", {{rs_str cli_name}});
            if err.is::<UnboundCommandError>() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
"#;

const HOOKS: &str = r#"//! Hook implementations for {{cli_name}}.
//!
//! cli-forge creates this file once and never overwrites it. Each command of
//! the generated CLI calls the first of its candidate names registered below.

#![allow(unused_imports)]

use crate::{Controller, HookRegistry, HookResult, Invocation};

pub fn register(registry: &mut HookRegistry) {
{{registrations}}    // Catch-all for commands without a dedicated hook:
    // registry.callable({{rs_str generic}}, {{generic}});
}

{{stubs}}// pub fn {{generic}}(invocation: &Invocation<'_>) -> HookResult {
//     println!("{}", invocation.path.join(" "));
//     Ok(())
// }
"#;

const MANIFEST: &str = r#"[package]
name = {{json package}}
version = {{json crate_version}}
description = {{json tagline}}
edition = "2021"

[[bin]]
name = {{json cli_name}}
path = "src/main.rs"

[dependencies]
clap = { version = "4.5", features = ["env"] }
"#;

const SETUP: &str = r#"#!/usr/bin/env bash
# Build and install {{cli_name}} with cargo.
set -euo pipefail

cd "$(dirname "$0")"

if ! command -v cargo >/dev/null 2>&1; then
    echo "cargo is required to install {{cli_name}}" >&2
    exit 1
fi

cargo install --path .
echo "{{cli_name}} installed. Run '{{cli_name}} --help' to get started."
"#;

/// clap builder-API renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct RustRenderer;

pub fn factory() -> Box<dyn Renderer> {
    Box::new(RustRenderer)
}

impl RustRenderer {
    fn contexts<'a>(&self, ir: &'a Ir) -> ContextBuilder<'a> {
        ContextBuilder {
            ir,
            naming: self.naming(),
            reserved: &RESERVED,
            root_var: "cli",
        }
    }
}

impl Renderer for RustRenderer {
    fn target_id(&self) -> &'static str {
        "rust"
    }

    fn display_name(&self) -> &'static str {
        "Rust (clap)"
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention::SNAKE
    }

    fn templates(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("rust/args", ARGS),
            ("rust/command", COMMAND),
            ("rust/managed", MANAGED),
            ("rust/stub_command", STUB_COMMAND),
            ("rust/stub_controller", STUB_CONTROLLER),
            ("rust/main", MAIN),
            ("rust/hooks", HOOKS),
            ("rust/manifest", MANIFEST),
            ("rust/setup", SETUP),
        ]
    }

    fn custom_filters(&self) -> Vec<CustomFilter> {
        vec![
            ("rs_str", Box::new(rs_str)),
            ("rs_char", Box::new(rs_char)),
            ("rs_slice", Box::new(rs_slice)),
            ("rs_parser", Box::new(rs_parser)),
            ("rs_type", Box::new(rs_type)),
            ("rs_default_call", Box::new(rs_default_call)),
        ]
    }

    fn transform_context(&self, ir: &Ir) -> Value {
        extend(
            self.contexts(ir).root(),
            json!({ "crate_version": crate_version(&ir.version) }),
        )
    }

    fn output_layout(&self, _ir: &Ir) -> IndexMap<String, String> {
        IndexMap::from([
            ("entry".to_string(), "src/main.rs".to_string()),
            ("hooks".to_string(), "src/hooks.rs".to_string()),
            ("manifest".to_string(), "Cargo.toml".to_string()),
            ("bootstrap".to_string(), "setup.sh".to_string()),
        ])
    }

    fn emit_command(
        &self,
        ctx: &EmitContext<'_>,
        node: &CommandNode,
        binding: &HookBinding,
        children: Vec<Fragment>,
    ) -> AppResult<Fragment> {
        let base = self.contexts(ctx.ir).node(node, binding);
        let args = ctx.engine.render("rust/args", &base)?;
        let node_ctx = extend(base, json!({ "args": args }));

        let mut fragment = Fragment::new(node.path());
        if let Some(controller) = &binding.controller {
            fragment.push("commands", &ctx.engine.render("rust/managed", &node_ctx)?);
            fragment.push("stubs", &ctx.engine.render("rust/stub_controller", &node_ctx)?);
            fragment.push(
                "registrations",
                &format!(
                    "    registry.controller({:?}, {});\n",
                    controller.canonical_name, controller.canonical_name
                ),
            );
        } else {
            fragment.push("commands", &ctx.engine.render("rust/command", &node_ctx)?);
            if !node.is_group() {
                fragment.push("stubs", &ctx.engine.render("rust/stub_command", &node_ctx)?);
                fragment.push(
                    "registrations",
                    &format!(
                        "    registry.callable({:?}, {});\n",
                        binding.canonical_name, binding.canonical_name
                    ),
                );
            }
        }
        fragment.absorb(&children);
        Ok(fragment)
    }

    fn compose(&self, ctx: &EmitContext<'_>, fragments: &[Fragment]) -> AppResult<Vec<Artifact>> {
        let globals = json!({
            "var": "global",
            "global": true,
            "arguments": [],
            "options": ctx.root["global_options"],
        });
        let root = extend(
            ctx.root.clone(),
            json!({
                "global_args": ctx.engine.render("rust/args", &globals)?,
                "commands_code": Fragment::join(fragments, "commands"),
                "stubs": Fragment::join(fragments, "stubs"),
                "registrations": Fragment::join(fragments, "registrations"),
            }),
        );

        let layout = self.output_layout(ctx.ir);
        let engine = ctx.engine;
        Ok(vec![
            Artifact::new(
                layout_path(&layout, "entry")?,
                engine.render("rust/main", &root)?,
                ArtifactKind::EntryPoint,
                "entry",
            ),
            Artifact::new(
                layout_path(&layout, "hooks")?,
                engine.render("rust/hooks", &root)?,
                ArtifactKind::HookStub,
                "hooks",
            ),
            Artifact::new(
                layout_path(&layout, "manifest")?,
                engine.render("rust/manifest", &root)?,
                ArtifactKind::Manifest,
                "manifest",
            ),
            Artifact::new(
                layout_path(&layout, "bootstrap")?,
                engine.render("rust/setup", &root)?,
                ArtifactKind::Bootstrap,
                "bootstrap",
            )
            .executable(),
        ])
    }
}
