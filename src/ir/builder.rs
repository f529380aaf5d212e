//! Tree builder
//!
//! Turns the neutral description value into an [`Ir`]. Construction walks the
//! input with an explicit work stack so the depth ceiling is enforced before
//! any native recursion could matter, then assembles the owned tree bottom-up.

use super::loader::cli_section;
use super::model::{Argument, CommandNode, Ir, Lifecycle, OptionSpec, ValueType};
use crate::errors::{AppError, AppResult};
use crate::hooks::naming::normalized_identifier;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Deepest nesting accepted unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Option names every generated parser already defines
const RESERVED_OPTIONS: [&str; 1] = ["help"];
const RESERVED_SHORTS: [char; 1] = ['h'];

/// Builds command trees with a configurable depth ceiling
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A node waiting for its children to be attached
struct Pending {
    node: CommandNode,
    children: Vec<usize>,
}

/// Work item: parent arena slot, parent path, name, raw body
type Frame<'a> = (Option<usize>, Vec<String>, String, &'a Value);

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A node at depth `d` is accepted while `d < max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Build a fresh tree from a parsed description.
    ///
    /// # Errors
    ///
    /// * `Schema` for malformed input, naming the command path and field
    /// * `DuplicateCommand` for sibling name, alias or identifier clashes
    /// * `DepthLimitExceeded` when a node sits at or beyond the ceiling
    pub fn build(&self, document: &Value) -> AppResult<Ir> {
        let cli = cli_section(document)
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::schema(&[], "CLI description must be a mapping"))?;

        let root: &[String] = &[];
        let cli_name = str_field(cli, "name", root)?
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::schema(root, "missing 'name'"))?
            .to_string();
        if !is_valid_name(&cli_name) {
            return Err(AppError::schema(root, format!("invalid CLI name '{cli_name}'")));
        }
        let version = str_field(cli, "version", root)?.unwrap_or("0.1.0").to_string();
        let tagline = str_field(cli, "tagline", root)?.unwrap_or_default().to_string();
        let description = str_field(cli, "description", root)?.map(String::from);
        let global_options = parse_options(cli.get("options"), root)?;

        let mut arena: Vec<Pending> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        for (name, body) in collect_siblings(cli.get("commands"), "commands", root)?
            .into_iter()
            .rev()
        {
            stack.push((None, Vec::new(), name, body));
        }

        while let Some((parent, parent_path, name, body)) = stack.pop() {
            let mut path = parent_path.clone();
            path.push(name.clone());
            if parent_path.len() >= self.max_depth {
                return Err(AppError::DepthLimitExceeded {
                    path,
                    limit: self.max_depth,
                });
            }

            let node = parse_node(name, body, parent_path, &path)?;
            let children = collect_siblings(
                body.as_object().and_then(|b| b.get("subcommands")),
                "subcommands",
                &path,
            )?;
            if node.lifecycle.is_managed() && !children.is_empty() {
                return Err(AppError::schema(
                    &path,
                    "managed commands cannot declare subcommands",
                ));
            }

            let slot = arena.len();
            arena.push(Pending {
                node,
                children: Vec::new(),
            });
            match parent {
                Some(parent) => arena[parent].children.push(slot),
                None => roots.push(slot),
            }

            for (child_name, child_body) in children.into_iter().rev() {
                stack.push((Some(slot), path.clone(), child_name, child_body));
            }
        }

        // Children always occupy later slots than their parent, so a reverse
        // sweep sees every child finished before its parent.
        let mut built: Vec<Option<CommandNode>> = (0..arena.len()).map(|_| None).collect();
        for (slot, pending) in arena.into_iter().enumerate().rev() {
            let Pending { mut node, children } = pending;
            for child in children {
                let child_node = built
                    .get_mut(child)
                    .and_then(Option::take)
                    .ok_or_else(|| AppError::internal("child assembled out of order"))?;
                node.subcommands.insert(child_node.name.clone(), child_node);
            }
            built[slot] = Some(node);
        }

        let mut commands = IndexMap::new();
        for slot in roots {
            let node = built
                .get_mut(slot)
                .and_then(Option::take)
                .ok_or_else(|| AppError::internal("top-level command missing after assembly"))?;
            commands.insert(node.name.clone(), node);
        }

        let ir = Ir {
            cli_name,
            version,
            tagline,
            description,
            global_options,
            commands,
        };
        debug!(
            cli = %ir.cli_name,
            nodes = ir.node_count(),
            depth = ir.max_depth(),
            "built command tree"
        );
        Ok(ir)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &[String]) -> AppResult<Option<&'a str>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(AppError::schema(
            path,
            format!("'{key}' must be a string, found {}", type_name(other)),
        )),
    }
}

fn bool_field(obj: &Map<String, Value>, key: &str, path: &[String]) -> AppResult<Option<bool>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(AppError::schema(
            path,
            format!("'{key}' must be a boolean, found {}", type_name(other)),
        )),
    }
}

/// `desc` with `description` accepted as a synonym
fn description_field<'a>(obj: &'a Map<String, Value>, path: &[String]) -> AppResult<Option<&'a str>> {
    match str_field(obj, "desc", path)? {
        Some(desc) => Ok(Some(desc)),
        None => str_field(obj, "description", path),
    }
}

/// Names start with a letter or digit and contain only letters, digits, `-`,
/// `_` and `.`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        _ => false,
    }
}

fn read_aliases(obj: &Map<String, Value>, path: &[String]) -> AppResult<Vec<String>> {
    let raw = obj.get("aliases").or_else(|| obj.get("alias"));
    let values: Vec<&Value> = match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };
    let mut aliases: Vec<String> = Vec::new();
    for value in values {
        let alias = value
            .as_str()
            .ok_or_else(|| AppError::schema(path, "aliases must be strings"))?;
        if !is_valid_name(alias) {
            return Err(AppError::schema(path, format!("invalid alias '{alias}'")));
        }
        let own_name = path.last().map(String::as_str);
        if Some(alias) != own_name && !aliases.iter().any(|a| a == alias) {
            aliases.push(alias.to_string());
        }
    }
    Ok(aliases)
}

/// Children of one container, in declaration order, with sibling uniqueness
/// enforced across names, aliases and normalised identifiers.
fn collect_siblings<'a>(
    container: Option<&'a Value>,
    field: &str,
    parent_path: &[String],
) -> AppResult<Vec<(String, &'a Value)>> {
    let entries: Vec<(String, &'a Value)> = match container {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.get("name")
                    .and_then(Value::as_str)
                    .map(|name| (name.to_string(), item))
                    .ok_or_else(|| {
                        AppError::schema(
                            parent_path,
                            format!("entries of '{field}' must be mappings with a 'name'"),
                        )
                    })
            })
            .collect::<AppResult<_>>()?,
        Some(other) => {
            return Err(AppError::schema(
                parent_path,
                format!("'{field}' must be a mapping or a list, found {}", type_name(other)),
            ))
        }
    };

    let mut tokens: HashSet<String> = HashSet::new();
    let mut identifiers: HashSet<String> = HashSet::new();
    for (name, body) in &entries {
        let mut path = parent_path.to_vec();
        path.push(name.clone());
        if !is_valid_name(name) {
            return Err(AppError::schema(&path, format!("invalid command name '{name}'")));
        }
        if !tokens.insert(name.clone()) || !identifiers.insert(normalized_identifier(name)) {
            return Err(AppError::DuplicateCommand { path });
        }
        if let Some(obj) = body.as_object() {
            for alias in read_aliases(obj, &path)? {
                if !tokens.insert(alias) {
                    return Err(AppError::DuplicateCommand { path });
                }
            }
        }
    }
    Ok(entries)
}

fn parse_node(
    name: String,
    body: &Value,
    parent_path: Vec<String>,
    path: &[String],
) -> AppResult<CommandNode> {
    let obj = body.as_object().ok_or_else(|| {
        AppError::schema(
            path,
            format!("command body must be a mapping, found {}", type_name(body)),
        )
    })?;

    let description = description_field(obj, path)?
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::schema(path, "missing 'desc'"))?
        .to_string();

    let lifecycle = match str_field(obj, "lifecycle", path)? {
        None => Lifecycle::Standard,
        Some(raw) => Lifecycle::parse(raw).ok_or_else(|| {
            AppError::schema(
                path,
                format!("unknown lifecycle '{raw}' (expected 'standard' or 'managed')"),
            )
        })?,
    };

    let arguments = parse_arguments(obj.get("args"), path)?;
    let options = parse_options(obj.get("options"), path)?;

    let argument_ids: HashSet<String> = arguments
        .iter()
        .map(|a| normalized_identifier(&a.name))
        .collect();
    if let Some(clash) = options
        .iter()
        .find(|o| argument_ids.contains(&normalized_identifier(&o.name)))
    {
        return Err(AppError::schema(
            path,
            format!("'{}' is declared as both an argument and an option", clash.name),
        ));
    }

    Ok(CommandNode {
        name,
        description,
        icon: str_field(obj, "icon", path)?.map(String::from),
        aliases: read_aliases(obj, path)?,
        hidden: bool_field(obj, "hidden", path)?.unwrap_or(false),
        arguments,
        options,
        subcommands: IndexMap::new(),
        lifecycle,
        depth: parent_path.len(),
        parent_path,
    })
}

/// Fields shared by arguments and options
struct Common {
    name: String,
    value_type: ValueType,
    description: String,
    choices: Option<Vec<Value>>,
    default: Option<Value>,
}

fn parse_common(
    obj: &Map<String, Value>,
    kind: &str,
    name: String,
    path: &[String],
) -> AppResult<Common> {
    let choices = match obj.get("choices") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(AppError::schema(path, format!("{kind} '{name}' has empty 'choices'")));
            }
            if let Some(bad) = items.iter().find(|v| v.is_array() || v.is_object() || v.is_null()) {
                return Err(AppError::schema(
                    path,
                    format!("{kind} '{name}' has a non-scalar choice ({})", type_name(bad)),
                ));
            }
            let mut unique: Vec<Value> = Vec::new();
            for item in items {
                if !unique.contains(item) {
                    unique.push(item.clone());
                }
            }
            Some(unique)
        }
        Some(other) => {
            return Err(AppError::schema(
                path,
                format!("{kind} '{name}': 'choices' must be a list, found {}", type_name(other)),
            ))
        }
    };

    let default = obj.get("default").filter(|v| !v.is_null()).cloned();

    let value_type = match str_field(obj, "type", path)? {
        Some(raw) => ValueType::parse(raw).ok_or_else(|| {
            AppError::schema(path, format!("{kind} '{name}' has unknown type '{raw}'"))
        })?,
        None if choices.is_some() => ValueType::Choice,
        None if matches!(default, Some(Value::Bool(_))) => ValueType::Boolean,
        None => ValueType::String,
    };

    if value_type == ValueType::Choice && choices.is_none() {
        return Err(AppError::schema(
            path,
            format!("{kind} '{name}' of type 'choice' needs 'choices'"),
        ));
    }
    if value_type == ValueType::Boolean && choices.is_some() {
        return Err(AppError::schema(
            path,
            format!("{kind} '{name}' is a flag and cannot have 'choices'"),
        ));
    }

    if let Some(default) = &default {
        let fits = match value_type {
            ValueType::Integer => default.is_i64() || default.is_u64(),
            ValueType::Float => default.is_number(),
            ValueType::Boolean => default.is_boolean(),
            ValueType::String | ValueType::Path => default.is_string(),
            ValueType::Choice => !default.is_array() && !default.is_object(),
        };
        if !fits {
            return Err(AppError::schema(
                path,
                format!(
                    "{kind} '{name}' default {default} is not a valid {}",
                    value_type.as_str()
                ),
            ));
        }
        if let Some(choices) = &choices {
            if !choices.contains(default) {
                return Err(AppError::schema(
                    path,
                    format!("{kind} '{name}' default {default} is not one of its choices"),
                ));
            }
        }
    }

    Ok(Common {
        name,
        value_type,
        description: description_field(obj, path)?.unwrap_or_default().trim().to_string(),
        choices,
        default,
    })
}

fn list_items<'a>(raw: Option<&'a Value>, field: &str, path: &[String]) -> AppResult<Vec<&'a Map<String, Value>>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    AppError::schema(path, format!("entries of '{field}' must be mappings"))
                })
            })
            .collect(),
        Some(other) => Err(AppError::schema(
            path,
            format!("'{field}' must be a list, found {}", type_name(other)),
        )),
    }
}

fn item_name(obj: &Map<String, Value>, kind: &str, path: &[String]) -> AppResult<String> {
    let raw = str_field(obj, "name", path)?
        .ok_or_else(|| AppError::schema(path, format!("{kind} without a 'name'")))?;
    let name = raw.trim_start_matches('-');
    if !is_valid_name(name) {
        return Err(AppError::schema(path, format!("invalid {kind} name '{raw}'")));
    }
    Ok(name.to_string())
}

fn parse_arguments(raw: Option<&Value>, path: &[String]) -> AppResult<Vec<Argument>> {
    let mut arguments: Vec<Argument> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for obj in list_items(raw, "args", path)? {
        let name = item_name(obj, "argument", path)?;
        if !seen.insert(normalized_identifier(&name)) {
            return Err(AppError::schema(path, format!("duplicate argument '{name}'")));
        }
        let common = parse_common(obj, "argument", name, path)?;
        let required = match bool_field(obj, "required", path)? {
            Some(true) if common.default.is_some() => {
                return Err(AppError::schema(
                    path,
                    format!("required argument '{}' cannot have a default", common.name),
                ))
            }
            Some(explicit) => explicit,
            None => common.default.is_none(),
        };
        if required && arguments.iter().any(|a| !a.required) {
            return Err(AppError::schema(
                path,
                format!("required argument '{}' follows an optional one", common.name),
            ));
        }
        arguments.push(Argument {
            name: common.name,
            value_type: common.value_type,
            description: common.description,
            required,
            choices: common.choices,
            default: common.default,
        });
    }
    Ok(arguments)
}

fn parse_options(raw: Option<&Value>, path: &[String]) -> AppResult<Vec<OptionSpec>> {
    let mut options: Vec<OptionSpec> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut shorts: HashSet<char> = HashSet::new();
    for obj in list_items(raw, "options", path)? {
        let name = item_name(obj, "option", path)?;
        if RESERVED_OPTIONS.contains(&name.as_str()) {
            return Err(AppError::schema(path, format!("option '--{name}' is reserved")));
        }
        if !names.insert(normalized_identifier(&name)) {
            return Err(AppError::schema(path, format!("duplicate option '--{name}'")));
        }

        let short = match str_field(obj, "short", path)? {
            None => None,
            Some(raw) => {
                let trimmed = raw.trim_start_matches('-');
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => Some(c),
                    _ => {
                        return Err(AppError::schema(
                            path,
                            format!("option '--{name}': 'short' must be a single character, got '{raw}'"),
                        ))
                    }
                }
            }
        };
        if let Some(c) = short {
            if RESERVED_SHORTS.contains(&c) {
                return Err(AppError::schema(path, format!("short flag '-{c}' is reserved")));
            }
            if !shorts.insert(c) {
                return Err(AppError::schema(path, format!("duplicate short flag '-{c}'")));
            }
        }

        let env_override = str_field(obj, "env", path)?.map(String::from);
        let required = bool_field(obj, "required", path)?.unwrap_or(false);
        let common = parse_common(obj, "option", name, path)?;
        options.push(OptionSpec {
            name: common.name,
            value_type: common.value_type,
            description: common.description,
            required,
            choices: common.choices,
            default: common.default,
            short,
            env_override,
        });
    }
    Ok(options)
}
