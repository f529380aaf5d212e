//! Template contexts shared by every target
//!
//! Node contexts carry the command data plus the computed binding, with
//! identifiers already made safe for the target language.

use crate::hooks::naming::{capitalize, normalized_identifier};
use crate::hooks::{HookBinding, NamingConvention};
use crate::ir::{Argument, CommandNode, Ir, Lifecycle, OptionSpec};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Variable name for a node's generated parser object.
///
/// Segments are joined with a double underscore, which never occurs inside a
/// normalised segment, so distinct paths never share a variable.
pub fn node_var(path: &[String]) -> String {
    let segments: Vec<String> = path.iter().map(|s| normalized_identifier(s)).collect();
    format!("cmd_{}", segments.join("__"))
}

/// Builds JSON contexts for one target
pub struct ContextBuilder<'a> {
    pub ir: &'a Ir,
    pub naming: NamingConvention,
    pub reserved: &'a HashSet<&'static str>,
    /// Variable holding the root parser (`main`, `program`, ...)
    pub root_var: &'a str,
}

impl<'a> ContextBuilder<'a> {
    /// A parameter identifier that is valid and not a keyword
    pub fn ident(&self, name: &str) -> String {
        let mut ident = self.naming.parameter(name);
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        if self.reserved.contains(ident.as_str()) {
            ident.push('_');
        }
        ident
    }

    pub fn argument(&self, arg: &Argument) -> Value {
        json!({
            "name": arg.name,
            "ident": self.ident(&arg.name),
            "key": self.naming.parameter(&arg.name),
            "metavar": normalized_identifier(&arg.name).to_uppercase(),
            "type": arg.value_type.as_str(),
            "description": arg.description,
            "required": arg.required,
            "choices": arg.choices,
            "has_choices": arg.choices.is_some(),
            "default": arg.default,
            "has_default": arg.default.is_some(),
        })
    }

    pub fn option(&self, opt: &OptionSpec, path: &[String]) -> Value {
        json!({
            "name": opt.name,
            "ident": self.ident(&opt.name),
            "key": self.naming.parameter(&opt.name),
            "type": opt.value_type.as_str(),
            "flag": opt.is_flag(),
            "description": opt.description,
            "required": opt.required,
            "short": opt.short.map(String::from),
            "env": opt.env_var(&self.ir.cli_name, path),
            "choices": opt.choices,
            "has_choices": opt.choices.is_some(),
            "default": opt.default,
            "has_default": opt.default.is_some(),
        })
    }

    /// Context for one command node and its binding
    pub fn node(&self, node: &CommandNode, binding: &HookBinding) -> Value {
        let path = node.path();
        let parent_var = if node.parent_path.is_empty() {
            self.root_var.to_string()
        } else {
            node_var(&node.parent_path)
        };
        let var = node_var(&path);
        let help = match &node.icon {
            Some(icon) => format!("{icon} {}", node.description),
            None => node.description.clone(),
        };

        let actions: Vec<Value> = match &binding.controller {
            Some(controller) => controller
                .actions
                .iter()
                .map(|action| {
                    json!({
                        "action": action.action,
                        "var": format!("{var}__{}", action.action),
                        "help": format!("{} {}", capitalize(&action.action), node.name),
                        "candidates": action.candidate_names,
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        json!({
            "name": node.name,
            "path": path,
            "path_display": path.join(" "),
            "var": var,
            "parent_var": parent_var,
            "depth": node.depth,
            "description": node.description,
            "help": help,
            "icon": node.icon,
            "aliases": node.aliases,
            "hidden": node.hidden,
            "is_group": node.is_group(),
            "is_managed": node.lifecycle == Lifecycle::Managed,
            "is_leaf": !node.is_group() && node.lifecycle == Lifecycle::Standard,
            "arguments": node.arguments.iter().map(|a| self.argument(a)).collect::<Vec<_>>(),
            "options": node.options.iter().map(|o| self.option(o, &path)).collect::<Vec<_>>(),
            "children": node.subcommands.values().map(|c| json!({
                "name": c.name,
                "var": node_var(&c.path()),
            })).collect::<Vec<_>>(),
            "canonical_name": binding.canonical_name,
            "candidates": binding.candidate_names,
            "controller": binding.controller.as_ref().map(|c| c.canonical_name.clone()),
            "controller_candidates": binding
                .controller
                .as_ref()
                .map(|c| c.candidate_names.clone())
                .unwrap_or_default(),
            "actions": actions,
            "generic": self.naming.generic(),
        })
    }

    /// Root context shared by every file template of a target
    pub fn root(&self) -> Value {
        json!({
            "cli_name": self.ir.cli_name,
            "package": self.ir.package_name(),
            "version": self.ir.version,
            "tagline": self.ir.tagline,
            "description": self.ir.description.clone().unwrap_or_else(|| self.ir.tagline.clone()),
            "global_options": self
                .ir
                .global_options
                .iter()
                .map(|o| self.option(o, &[]))
                .collect::<Vec<_>>(),
            "commands": self
                .ir
                .commands
                .values()
                .map(|c| json!({"name": c.name, "var": node_var(&c.path())}))
                .collect::<Vec<_>>(),
            "root_var": self.root_var,
            "generic": self.naming.generic(),
        })
    }
}

/// Insert extra keys into an object context
pub fn extend(mut context: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut context, extra) {
        base.extend(extra);
    }
    context
}
