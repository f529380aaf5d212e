//! commander-based targets
//!
//! Node.js and TypeScript share the command tree code; they differ in the
//! entry point runtime, the hook stubs and the package files. The TypeScript
//! specific templates live in [`super::typescript`].

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
        "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
        "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
        "new", "null", "package", "private", "protected", "public", "return", "static", "super",
        "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
        "with", "yield", "args", "hooks", "program", "values",
    ]
    .into_iter()
    .collect()
});

fn js_literal(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Default value as commander sees it; choices are compared as strings
fn default_of(param: &Value) -> String {
    let default = &param["default"];
    match default {
        Value::String(_) => js_literal(default),
        other if param["has_choices"].as_bool().unwrap_or(false) => {
            js_literal(&Value::String(other.to_string()))
        }
        other => js_literal(other),
    }
}

fn choices_of(param: &Value) -> String {
    let choices: Vec<Value> = param["choices"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(_) => item.clone(),
                    other => Value::String(other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();
    js_literal(&Value::Array(choices))
}

fn arg_syntax_of(arg: &Value) -> String {
    let name = arg["name"].as_str().unwrap_or_default();
    let syntax = if arg["required"].as_bool().unwrap_or(false) {
        format!("<{name}>")
    } else {
        format!("[{name}]")
    };
    js_literal(&Value::String(syntax))
}

fn option_flags_of(option: &Value) -> String {
    let name = option["name"].as_str().unwrap_or_default();
    let mut flags = String::new();
    if let Some(short) = option["short"].as_str() {
        flags.push_str(&format!("-{short}, "));
    }
    flags.push_str(&format!("--{name}"));
    if !option["flag"].as_bool().unwrap_or(false) {
        flags.push_str(&format!(" <{name}>"));
    }
    js_literal(&Value::String(flags))
}

/// `.argParser(...)` call for numeric values; choices validate themselves
fn parser_of(param: &Value) -> String {
    if param["has_choices"].as_bool().unwrap_or(false) || param["flag"].as_bool().unwrap_or(false) {
        return String::new();
    }
    match param["type"].as_str() {
        Some("integer") => ".argParser(parseInteger)".to_string(),
        Some("float") => ".argParser(parseNumber)".to_string(),
        Some("boolean") => ".argParser(parseBoolean)".to_string(),
        _ => String::new(),
    }
}

handlebars_helper!(js_str: |v: Json| js_literal(v));
handlebars_helper!(js_default: |param: Json| default_of(param));
handlebars_helper!(js_choices: |param: Json| choices_of(param));
handlebars_helper!(arg_syntax: |arg: Json| arg_syntax_of(arg));
handlebars_helper!(option_flags: |option: Json| option_flags_of(option));
handlebars_helper!(commander_parser: |param: Json| parser_of(param));

fn params_of(node: &Value) -> Vec<Value> {
    ["arguments", "options"]
        .iter()
        .flat_map(|field| node[*field].as_array().cloned().unwrap_or_default())
        .collect()
}

/// Destructuring pattern for a hook's single values object
fn destructure(node: &Value) -> String {
    let entries: Vec<String> = params_of(node)
        .iter()
        .map(|param| {
            let key = param["key"].as_str().unwrap_or_default();
            let ident = param["ident"].as_str().unwrap_or_default();
            if key == ident {
                key.to_string()
            } else {
                format!("{key}: {ident}")
            }
        })
        .collect();
    if entries.is_empty() {
        String::new()
    } else {
        format!("{{ {} }}", entries.join(", "))
    }
}

fn arg_keys(node: &Value) -> Value {
    node["arguments"]
        .as_array()
        .map(|args| args.iter().map(|a| a["key"].clone()).collect())
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

const PARAMS: &str = r#"{{#each arguments}}
  .addArgument(new Argument({{arg_syntax this}}, {{js_str description}}){{#if has_choices}}.choices({{js_choices this}}){{/if}}{{#if has_default}}.default({{js_default this}}){{/if}}{{commander_parser this}})
{{/each}}
{{#each options}}
  .addOption(new Option({{option_flags this}}, {{js_str description}}){{#if has_choices}}.choices({{js_choices this}}){{/if}}{{#if has_default}}.default({{js_default this}}){{/if}}.env({{js_str env}}){{commander_parser this}}{{#if required}}.makeOptionMandatory(){{/if}})
{{/each}}
"#;

const COMMAND: &str = r#"const {{var}} = {{parent_var}}
  .command({{js_str name}}{{#if hidden}}, { hidden: true }{{/if}})
  .description({{js_str help}}){{#if aliases}}
  .aliases({{js_str aliases}}){{/if}}
{{params}}  .action(async ({{rest_param}}) => {
    await invoke({{js_str path}}, {{js_str candidates}}, collect({{var}}, args, {{js_str arg_keys}}));
  });

"#;

const GROUP: &str = r#"const {{var}} = {{parent_var}}
  .command({{js_str name}}{{#if hidden}}, { hidden: true }{{/if}})
  .description({{js_str help}}){{#if aliases}}
  .aliases({{js_str aliases}}){{/if}}
{{params}}  .action(async ({{rest_param}}) => {
    await dispatchGroup({{var}}, {{js_str path}}, {{js_str candidates}}, collect({{var}}, args, {{js_str arg_keys}}));
  });

"#;

const MANAGED: &str = r#"const {{var}} = {{parent_var}}
  .command({{js_str name}}{{#if hidden}}, { hidden: true }{{/if}})
  .description({{js_str help}}){{#if aliases}}
  .aliases({{js_str aliases}}){{/if}};

{{#each actions}}
const {{var}} = {{../var}}
  .command({{js_str action}})
  .description({{js_str help}})
{{../params}}  .action(async ({{../rest_param}}) => {
    await invokeManaged({{js_str ../path}}, {{js_str ../controller_candidates}}, {{js_str action}}, {{js_str candidates}}, collect({{var}}, args, {{js_str ../arg_keys}}));
  });

{{/each}}
"#;

const CLI: &str = r#"#!/usr/bin/env node
// {{cli_name}} command-line interface.
//
// Generated by cli-forge. Do not edit this file; implement commands in
// src/hooks.js.
"use strict";

const { Argument, Command, InvalidArgumentError, Option } = require("commander");

let hooks = {};
try {
  hooks = require("./src/hooks");
} catch (error) {
  if (error.code !== "MODULE_NOT_FOUND") {
    throw error;
  }
}

const GENERIC_HOOK = {{js_str generic}};

class UnboundCommandError extends Error {
  constructor(commandPath, tried) {
    super(`Command '${commandPath.join(" ")}' is not bound (tried: ${tried.join(", ")})`);
    this.name = "UnboundCommandError";
    this.commandPath = commandPath;
    this.tried = tried;
  }
}

function parseInteger(value) {
  const parsed = Number.parseInt(value, 10);
  if (Number.isNaN(parsed) || String(parsed) !== value.trim()) {
    throw new InvalidArgumentError("Not an integer.");
  }
  return parsed;
}

function parseNumber(value) {
  const parsed = Number(value);
  if (value.trim() === "" || Number.isNaN(parsed)) {
    throw new InvalidArgumentError("Not a number.");
  }
  return parsed;
}

function parseBoolean(value) {
  const normalized = value.trim().toLowerCase();
  if (["1", "true", "yes", "on"].includes(normalized)) {
    return true;
  }
  if (["0", "false", "no", "off"].includes(normalized)) {
    return false;
  }
  throw new InvalidArgumentError("Not a boolean.");
}

function collect(command, args, names) {
  const values = {};
  names.forEach((name, index) => {
    values[name] = args[index];
  });
  return Object.assign(values, command.optsWithGlobals());
}

function isClass(value) {
  return typeof value === "function" && /^class[\s{]/.test(Function.prototype.toString.call(value));
}

async function invoke(commandPath, candidates, values) {
  for (const name of candidates) {
    const hook = hooks[name];
    if (typeof hook !== "function") {
      continue;
    }
    if (name === GENERIC_HOOK) {
      return hook(commandPath, values);
    }
    return hook(values);
  }
  throw new UnboundCommandError(commandPath, candidates);
}

async function invokeManaged(commandPath, controllers, action, candidates, values) {
  for (const name of controllers) {
    const target = hooks[name];
    if (target === undefined) {
      continue;
    }
    const controller = isClass(target) ? new target() : target;
    if (controller && typeof controller[action] === "function") {
      return controller[action](values);
    }
  }
  return invoke([...commandPath, action], candidates, values);
}

async function dispatchGroup(command, commandPath, candidates, values) {
  for (const name of candidates) {
    if (name !== GENERIC_HOOK && typeof hooks[name] === "function") {
      return invoke(commandPath, [name], values);
    }
  }
  command.help();
}

const program = new Command();
program
  .name({{js_str cli_name}})
  .description({{js_str description}})
  .version({{js_str version}})
{{global_params}};

{{commands_code}}program.parseAsync(process.argv).catch((error) => {
  if (error instanceof UnboundCommandError) {
    console.error(`${program.name()}: ${error.message}`);
    process.exit(2);
  }
  console.error(error);
  process.exit(1);
});
"#;

const STUB_COMMAND: &str = r#"// {{one_line description}}
async function {{canonical_name}}({{destructure}}) {
  console.log("{{path_display}}: not implemented yet");
}

"#;

const STUB_CONTROLLER: &str = r#"// {{one_line description}}
class {{controller}} {
{{#each actions}}
  async {{action}}(values) {
    console.log("{{../path_display}} {{action}}: not implemented yet", values);
  }
{{/each}}
}

"#;

const HOOKS: &str = r#"// Hook implementations for {{cli_name}}.
//
// cli-forge creates this file once and never overwrites it. Each command of
// the generated CLI calls the first of its candidate names exported here.
"use strict";

{{stubs}}// Catch-all for commands without a dedicated hook:
//
// async function {{generic}}(commandPath, values) {
//   console.log(commandPath.join(" "), values);
// }

module.exports = {
{{exports}}};
"#;

const PACKAGE: &str = r#"{
  "name": {{js_str cli_name}},
  "version": {{js_str version}},
  "description": {{js_str tagline}},
  "main": "cli.js",
  "bin": {
    {{js_str cli_name}}: "cli.js"
  },
  "files": ["cli.js", "src/"],
  "engines": {
    "node": ">=18"
  },
  "dependencies": {
    "commander": "^12.1.0"
  }
}
"#;

const SETUP: &str = r#"#!/usr/bin/env bash
# Install {{cli_name}} and link it onto the PATH.
set -euo pipefail

cd "$(dirname "$0")"

if ! command -v npm >/dev/null 2>&1; then
    echo "npm is required to install {{cli_name}}" >&2
    exit 1
fi

npm install
npm link
echo "{{cli_name}} installed. Run '{{cli_name}} --help' to get started."
"#;

/// Which commander dialect to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    JavaScript,
    TypeScript,
}

/// commander-based renderer for Node.js and TypeScript
#[derive(Debug, Clone, Copy)]
pub struct CommanderRenderer {
    flavor: Flavor,
}

pub fn factory() -> Box<dyn Renderer> {
    Box::new(CommanderRenderer::javascript())
}

impl CommanderRenderer {
    pub fn javascript() -> Self {
        Self {
            flavor: Flavor::JavaScript,
        }
    }

    pub fn typescript() -> Self {
        Self {
            flavor: Flavor::TypeScript,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn contexts<'a>(&self, ir: &'a Ir) -> ContextBuilder<'a> {
        ContextBuilder {
            ir,
            naming: self.naming(),
            reserved: &RESERVED,
            root_var: "program",
        }
    }

    /// Flavor specific template name
    fn template(&self, name: &str) -> String {
        format!("{}/{name}", self.target_id())
    }

    fn rest_param(&self) -> &'static str {
        match self.flavor {
            Flavor::JavaScript => "...args",
            Flavor::TypeScript => "...args: unknown[]",
        }
    }
}

impl Renderer for CommanderRenderer {
    fn target_id(&self) -> &'static str {
        match self.flavor {
            Flavor::JavaScript => "nodejs",
            Flavor::TypeScript => "typescript",
        }
    }

    fn display_name(&self) -> &'static str {
        match self.flavor {
            Flavor::JavaScript => "Node.js (commander)",
            Flavor::TypeScript => "TypeScript (commander)",
        }
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention::CAMEL
    }

    fn templates(&self) -> Vec<(&'static str, &'static str)> {
        let mut templates = vec![
            ("commander/params", PARAMS),
            ("commander/command", COMMAND),
            ("commander/group", GROUP),
            ("commander/managed", MANAGED),
        ];
        match self.flavor {
            Flavor::JavaScript => templates.extend([
                ("nodejs/cli", CLI),
                ("nodejs/stub_command", STUB_COMMAND),
                ("nodejs/stub_controller", STUB_CONTROLLER),
                ("nodejs/hooks", HOOKS),
                ("nodejs/package", PACKAGE),
                ("nodejs/setup", SETUP),
            ]),
            Flavor::TypeScript => templates.extend(super::typescript::templates()),
        }
        templates
    }

    fn custom_filters(&self) -> Vec<CustomFilter> {
        vec![
            ("js_str", Box::new(js_str)),
            ("js_default", Box::new(js_default)),
            ("js_choices", Box::new(js_choices)),
            ("arg_syntax", Box::new(arg_syntax)),
            ("option_flags", Box::new(option_flags)),
            ("commander_parser", Box::new(commander_parser)),
        ]
    }

    fn transform_context(&self, ir: &Ir) -> Value {
        self.contexts(ir).root()
    }

    fn output_layout(&self, _ir: &Ir) -> IndexMap<String, String> {
        let mut layout = IndexMap::new();
        match self.flavor {
            Flavor::JavaScript => {
                layout.insert("entry".to_string(), "cli.js".to_string());
                layout.insert("hooks".to_string(), "src/hooks.js".to_string());
            }
            Flavor::TypeScript => {
                layout.insert("entry".to_string(), "cli.ts".to_string());
                layout.insert("hooks".to_string(), "src/hooks.ts".to_string());
                layout.insert("tsconfig".to_string(), "tsconfig.json".to_string());
            }
        }
        layout.insert("manifest".to_string(), "package.json".to_string());
        layout.insert("bootstrap".to_string(), "setup.sh".to_string());
        layout
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
            "rest_param": self.rest_param(),
            "arg_keys": arg_keys(&base),
            "destructure": destructure(&base),
        });
        let base = extend(base, extras);
        let params = ctx.engine.render("commander/params", &base)?;
        let node_ctx = extend(base, json!({ "params": params }));

        let template = if node.lifecycle.is_managed() {
            "commander/managed"
        } else if node.is_group() {
            "commander/group"
        } else {
            "commander/command"
        };
        let mut fragment =
            Fragment::new(node.path()).with("commands", &ctx.engine.render(template, &node_ctx)?);

        if let Some(controller) = &binding.controller {
            fragment.push(
                "stubs",
                &ctx.engine.render(&self.template("stub_controller"), &node_ctx)?,
            );
            fragment.push("exports", &format!("  {},\n", controller.canonical_name));
        } else if !node.is_group() {
            fragment.push(
                "stubs",
                &ctx.engine.render(&self.template("stub_command"), &node_ctx)?,
            );
            fragment.push("exports", &format!("  {},\n", binding.canonical_name));
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
                "global_params": ctx.engine.render("commander/params", &globals)?,
                "rest_param": self.rest_param(),
                "commands_code": Fragment::join(fragments, "commands"),
                "stubs": Fragment::join(fragments, "stubs"),
                "exports": Fragment::join(fragments, "exports"),
            }),
        );

        let layout = self.output_layout(ctx.ir);
        let engine = ctx.engine;
        let entry = Artifact::new(
            layout_path(&layout, "entry")?,
            engine.render(&self.template("cli"), &root)?,
            ArtifactKind::EntryPoint,
            "entry",
        );
        let mut artifacts = vec![
            match self.flavor {
                Flavor::JavaScript => entry.executable(),
                // compiled to dist/ before it runs
                Flavor::TypeScript => entry,
            },
            Artifact::new(
                layout_path(&layout, "hooks")?,
                engine.render(&self.template("hooks"), &root)?,
                ArtifactKind::HookStub,
                "hooks",
            ),
            Artifact::new(
                layout_path(&layout, "manifest")?,
                engine.render(&self.template("package"), &root)?,
                ArtifactKind::Manifest,
                "manifest",
            ),
        ];
        if self.flavor == Flavor::TypeScript {
            artifacts.push(Artifact::new(
                layout_path(&layout, "tsconfig")?,
                engine.render("typescript/tsconfig", &root)?,
                ArtifactKind::Support,
                "tsconfig",
            ));
        }
        artifacts.push(
            Artifact::new(
                layout_path(&layout, "bootstrap")?,
                engine.render(&self.template("setup"), &root)?,
                ArtifactKind::Bootstrap,
                "bootstrap",
            )
            .executable(),
        );
        Ok(artifacts)
    }
}
