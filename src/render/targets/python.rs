//! Python target: click decorators, a `pyproject.toml` package and a user
//! owned `cli_hooks.py`.

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
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield", "ctx", "self",
    ]
    .into_iter()
    .collect()
});

/// Python literal for a JSON value
fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap_or_default(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(py_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", py_literal(&Value::String(k.clone())), py_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// click compares choices as strings
fn as_choice_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn click_type_of(param: &Value) -> String {
    if param["flag"].as_bool().unwrap_or(false) {
        return "bool".to_string();
    }
    match param["type"].as_str().unwrap_or("string") {
        "integer" => "int".to_string(),
        "float" => "float".to_string(),
        "boolean" => "bool".to_string(),
        "path" => "click.Path()".to_string(),
        "choice" => {
            let choices: Vec<Value> = param["choices"]
                .as_array()
                .map(|items| items.iter().map(as_choice_string).collect())
                .unwrap_or_default();
            format!("click.Choice({})", py_literal(&Value::Array(choices)))
        }
        _ => "str".to_string(),
    }
}

fn default_of(param: &Value) -> String {
    let default = &param["default"];
    if param["has_choices"].as_bool().unwrap_or(false) {
        py_literal(&as_choice_string(default))
    } else {
        py_literal(default)
    }
}

fn decls_of(option: &Value) -> String {
    let mut decls = Vec::new();
    if let Some(short) = option["short"].as_str() {
        decls.push(py_literal(&json!(format!("-{short}"))));
    }
    decls.push(py_literal(&json!(format!("--{}", option["name"].as_str().unwrap_or_default()))));
    decls.push(py_literal(&option["ident"]));
    decls.join(", ")
}

handlebars_helper!(py_str: |v: Json| py_literal(v));
handlebars_helper!(py_bool: |b: bool| if b { "True" } else { "False" });
handlebars_helper!(py_tuple: |items: array| {
    let parts: Vec<String> = items.iter().map(py_literal).collect();
    match parts.len() {
        1 => format!("({},)", parts[0]),
        _ => format!("({})", parts.join(", ")),
    }
});
handlebars_helper!(click_type: |param: Json| click_type_of(param));
handlebars_helper!(py_default: |param: Json| default_of(param));
handlebars_helper!(click_decls: |option: Json| decls_of(option));

fn idents(node: &Value) -> Vec<String> {
    ["arguments", "options"]
        .iter()
        .flat_map(|field| node[*field].as_array().cloned().unwrap_or_default())
        .filter_map(|param| param["ident"].as_str().map(String::from))
        .collect()
}

/// Parameter list of a generated function
fn params(node: &Value, with_ctx: bool) -> String {
    let mut names = Vec::new();
    if with_ctx {
        names.push("ctx".to_string());
    }
    names.extend(idents(node));
    names.join(", ")
}

/// Keyword arguments handed to a hook, keyed by the declared names
fn kwargs(node: &Value) -> String {
    let entries: Vec<String> = ["arguments", "options"]
        .iter()
        .flat_map(|field| node[*field].as_array().cloned().unwrap_or_default())
        .map(|param| {
            format!(
                "{}: {}",
                py_literal(&param["ident"]),
                param["ident"].as_str().unwrap_or_default()
            )
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

const PARAMS: &str = r#"{{#each arguments}}
@click.argument({{py_str ident}}, metavar={{py_str metavar}}, type={{click_type this}}, required={{py_bool required}}{{#if has_default}}, default={{py_default this}}{{/if}})
{{/each}}
{{#each options}}
@click.option({{click_decls this}}, type={{click_type this}}{{#if flag}}, is_flag=True{{/if}}{{#if has_default}}, default={{py_default this}}, show_default=True{{/if}}, required={{py_bool required}}, envvar={{py_str env}}, help={{py_str description}})
{{/each}}
"#;

const COMMAND: &str = r#"@{{parent_var}}.command({{py_str name}}{{#if hidden}}, hidden=True{{/if}}, help={{py_str help}})
{{decorators}}def {{var}}({{py_params}}):
    {{py_str description}}
    _invoke({{py_tuple path}}, {{py_str candidates}}, {{py_kwargs}})
{{#each aliases}}
{{../parent_var}}.aliases[{{py_str this}}] = {{py_str ../name}}
{{/each}}


"#;

const GROUP: &str = r#"@{{parent_var}}.group({{py_str name}}, cls=_ForgeGroup, invoke_without_command=True{{#if hidden}}, hidden=True{{/if}}, help={{py_str help}})
{{decorators}}@click.pass_context
def {{var}}({{py_params_ctx}}):
    {{py_str description}}
    if ctx.invoked_subcommand is None:
        _dispatch_group(ctx, {{py_tuple path}}, {{py_str candidates}}, {{py_kwargs}})
{{#each aliases}}
{{../parent_var}}.aliases[{{py_str this}}] = {{py_str ../name}}
{{/each}}


"#;

const MANAGED: &str = r#"@{{parent_var}}.group({{py_str name}}, cls=_ForgeGroup{{#if hidden}}, hidden=True{{/if}}, help={{py_str help}})
def {{var}}():
    {{py_str description}}
{{#each aliases}}
{{../parent_var}}.aliases[{{py_str this}}] = {{py_str ../name}}
{{/each}}


{{#each actions}}
@{{../var}}.command({{py_str action}}, help={{py_str help}})
{{../decorators}}def {{var}}({{../py_params}}):
    _invoke_managed({{py_tuple ../path}}, {{py_str ../controller_candidates}}, {{py_str action}}, {{py_str candidates}}, {{../py_kwargs}})


{{/each}}
"#;

const STUB_COMMAND: &str = r#"def {{canonical_name}}({{py_params}}{{#if has_globals}}{{#if py_params}}, {{/if}}**_globals{{/if}}):
    {{py_str description}}
    click.echo("{{path_display}}: not implemented yet")


"#;

const STUB_CONTROLLER: &str = r#"class {{controller}}:
    {{py_str description}}
{{#each actions}}

    def {{action}}(self{{#if ../py_params}}, {{../py_params}}{{/if}}{{#if ../has_globals}}, **_globals{{/if}}):
        click.echo("{{../path_display}} {{action}}: not implemented yet")
{{/each}}


"#;

const CLI: &str = r#"#!/usr/bin/env python3
# {{cli_name}} command-line interface.
#
# Generated by cli-forge. Do not edit this file; implement commands in
# cli_hooks.py next to it.

import click

try:
    from . import cli_hooks as _hooks
except ImportError:
    try:
        import cli_hooks as _hooks
    except ImportError:
        _hooks = None

GENERIC_HOOK = {{py_str generic}}


class UnboundCommandError(click.ClickException):
    """No hook is bound for a command."""

    def __init__(self, command_path, tried):
        self.command_path = list(command_path)
        self.tried = list(tried)
        super().__init__(
            "Command '{}' is not bound (tried: {})".format(
                " ".join(self.command_path), ", ".join(self.tried)
            )
        )


class _ForgeGroup(click.Group):
    """A click group that also resolves command aliases."""

    def __init__(self, *args, **kwargs):
        super().__init__(*args, **kwargs)
        self.aliases = {}

    def get_command(self, ctx, cmd_name):
        return super().get_command(ctx, self.aliases.get(cmd_name, cmd_name))


def _lookup(name):
    if _hooks is None:
        return None
    return getattr(_hooks, name, None)


def _with_globals(kwargs):
    ctx = click.get_current_context(silent=True)
    merged = dict(ctx.find_root().obj or {}) if ctx is not None else {}
    merged.update(kwargs)
    return merged


def _invoke(command_path, candidates, kwargs):
    kwargs = _with_globals(kwargs)
    for name in candidates:
        hook = _lookup(name)
        if hook is None:
            continue
        if name == GENERIC_HOOK:
            return hook(list(command_path), **kwargs)
        return hook(**kwargs)
    raise UnboundCommandError(command_path, candidates)


def _invoke_managed(command_path, controllers, action, candidates, kwargs):
    for name in controllers:
        target = _lookup(name)
        if target is None:
            continue
        controller = target() if isinstance(target, type) else target
        method = getattr(controller, action, None)
        if method is not None:
            return method(**_with_globals(kwargs))
    return _invoke(list(command_path) + [action], candidates, kwargs)


def _dispatch_group(ctx, command_path, candidates, kwargs):
    for name in candidates:
        if name != GENERIC_HOOK and _lookup(name) is not None:
            return _invoke(command_path, [name], kwargs)
    click.echo(ctx.get_help())


@click.group(cls=_ForgeGroup, invoke_without_command=True, help={{py_str description}})
@click.version_option({{py_str version}}, prog_name={{py_str cli_name}})
{{global_decorators}}@click.pass_context
def main({{global_params}}):
    ctx.ensure_object(dict)
{{#each global_options}}
    ctx.obj[{{py_str key}}] = {{ident}}
{{/each}}
    if ctx.invoked_subcommand is None:
        click.echo(ctx.get_help())


{{commands_code}}if __name__ == "__main__":
    main()
"#;

const HOOKS: &str = r#"# Hook implementations for {{cli_name}}.
#
# cli-forge creates this file once and never overwrites it. Each command of
# the generated CLI calls the first of its candidate names defined here.

import click


{{stubs}}# Catch-all for commands without a dedicated hook:
#
# def {{generic}}(command_path, **kwargs):
#     click.echo("{}: {}".format(" ".join(command_path), kwargs))
"#;

const INIT: &str = r#""""{{cli_name}} package."""

__version__ = {{py_str version}}
"#;

const PYPROJECT: &str = r#"[build-system]
requires = ["setuptools>=61.0"]
build-backend = "setuptools.build_meta"

[project]
name = {{py_str cli_name}}
version = {{py_str version}}
description = {{py_str tagline}}
requires-python = ">=3.8"
dependencies = ["click>=8.0"]

[project.scripts]
{{cli_name}} = "{{package}}.cli:main"

[tool.setuptools.packages.find]
where = ["src"]
"#;

const SETUP: &str = r#"#!/usr/bin/env bash
# Install {{cli_name}} for the current user.
set -euo pipefail

cd "$(dirname "$0")"

if ! command -v python3 >/dev/null 2>&1; then
    echo "python3 is required to install {{cli_name}}" >&2
    exit 1
fi

python3 -m pip install --user -e .
echo "{{cli_name}} installed. Run '{{cli_name}} --help' to get started."
"#;

/// click-based Python renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonRenderer;

pub fn factory() -> Box<dyn Renderer> {
    Box::new(PythonRenderer)
}

impl PythonRenderer {
    fn contexts<'a>(&self, ir: &'a Ir) -> ContextBuilder<'a> {
        ContextBuilder {
            ir,
            naming: self.naming(),
            reserved: &RESERVED,
            root_var: "main",
        }
    }
}

impl Renderer for PythonRenderer {
    fn target_id(&self) -> &'static str {
        "python"
    }

    fn display_name(&self) -> &'static str {
        "Python (click)"
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention::SNAKE
    }

    fn templates(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("python/params", PARAMS),
            ("python/command", COMMAND),
            ("python/group", GROUP),
            ("python/managed", MANAGED),
            ("python/stub_command", STUB_COMMAND),
            ("python/stub_controller", STUB_CONTROLLER),
            ("python/cli", CLI),
            ("python/hooks", HOOKS),
            ("python/init", INIT),
            ("python/pyproject", PYPROJECT),
            ("python/setup", SETUP),
        ]
    }

    fn custom_filters(&self) -> Vec<CustomFilter> {
        vec![
            ("py_str", Box::new(py_str)),
            ("py_bool", Box::new(py_bool)),
            ("py_tuple", Box::new(py_tuple)),
            ("py_default", Box::new(py_default)),
            ("click_type", Box::new(click_type)),
            ("click_decls", Box::new(click_decls)),
        ]
    }

    fn transform_context(&self, ir: &Ir) -> Value {
        self.contexts(ir).root()
    }

    fn output_layout(&self, ir: &Ir) -> IndexMap<String, String> {
        let package = ir.package_name();
        IndexMap::from([
            ("entry".to_string(), format!("src/{package}/cli.py")),
            ("package_init".to_string(), format!("src/{package}/__init__.py")),
            ("hooks".to_string(), format!("src/{package}/cli_hooks.py")),
            ("manifest".to_string(), "pyproject.toml".to_string()),
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
        let extras = json!({
            "py_params": params(&base, false),
            "py_params_ctx": params(&base, true),
            "py_kwargs": kwargs(&base),
            "has_globals": !ctx.ir.global_options.is_empty(),
        });
        let base = extend(base, extras);
        let decorators = ctx.engine.render("python/params", &base)?;
        let node_ctx = extend(base, json!({ "decorators": decorators }));

        let (template, stub) = if node.lifecycle.is_managed() {
            ("python/managed", Some("python/stub_controller"))
        } else if node.is_group() {
            ("python/group", None)
        } else {
            ("python/command", Some("python/stub_command"))
        };

        let mut fragment =
            Fragment::new(node.path()).with("commands", &ctx.engine.render(template, &node_ctx)?);
        if let Some(stub) = stub {
            fragment.push("stubs", &ctx.engine.render(stub, &node_ctx)?);
        }
        fragment.absorb(&children);
        Ok(fragment)
    }

    fn compose(&self, ctx: &EmitContext<'_>, fragments: &[Fragment]) -> AppResult<Vec<Artifact>> {
        let globals = json!({
            "arguments": [],
            "options": ctx.root["global_options"],
        });
        let root = extend(
            ctx.root.clone(),
            json!({
                "global_decorators": ctx.engine.render("python/params", &globals)?,
                "global_params": params(&globals, true),
                "commands_code": Fragment::join(fragments, "commands"),
                "stubs": Fragment::join(fragments, "stubs"),
            }),
        );

        let layout = self.output_layout(ctx.ir);
        let engine = ctx.engine;
        Ok(vec![
            Artifact::new(
                layout_path(&layout, "entry")?,
                engine.render("python/cli", &root)?,
                ArtifactKind::EntryPoint,
                "entry",
            )
            .executable(),
            Artifact::new(
                layout_path(&layout, "package_init")?,
                engine.render("python/init", &root)?,
                ArtifactKind::Support,
                "package_init",
            ),
            Artifact::new(
                layout_path(&layout, "hooks")?,
                engine.render("python/hooks", &root)?,
                ArtifactKind::HookStub,
                "hooks",
            ),
            Artifact::new(
                layout_path(&layout, "manifest")?,
                engine.render("python/pyproject", &root)?,
                ArtifactKind::Manifest,
                "manifest",
            ),
            Artifact::new(
                layout_path(&layout, "bootstrap")?,
                engine.render("python/setup", &root)?,
                ArtifactKind::Bootstrap,
                "bootstrap",
            )
            .executable(),
        ])
    }
}
