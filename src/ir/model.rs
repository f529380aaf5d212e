//! Command tree model
//!
//! The canonical, renderer-agnostic representation of a CLI. Trees are built
//! once by [`TreeBuilder`](super::builder::TreeBuilder) and handed to
//! renderers by shared reference only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value type of an argument or option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Choice,
    Path,
}

impl ValueType {
    /// Parse the spellings accepted in CLI descriptions
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "str" | "string" | "text" => Some(Self::String),
            "int" | "integer" => Some(Self::Integer),
            "float" | "number" => Some(Self::Float),
            "bool" | "boolean" | "flag" => Some(Self::Boolean),
            "choice" | "enum" => Some(Self::Choice),
            "path" | "file" | "dir" => Some(Self::Path),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Choice => "choice",
            Self::Path => "path",
        }
    }
}

/// How a command binds to user code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// A single callable per command
    #[default]
    Standard,
    /// A controller object with start/stop/restart/status methods
    Managed,
}

impl Lifecycle {
    /// Actions every managed controller exposes, in emission order
    pub const ACTIONS: [&'static str; 4] = ["start", "stop", "restart", "status"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "standard" => Some(Self::Standard),
            "managed" => Some(Self::Managed),
            _ => None,
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed)
    }
}

/// A positional argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: String,
    pub value_type: ValueType,
    pub description: String,
    pub required: bool,
    pub choices: Option<Vec<Value>>,
    pub default: Option<Value>,
}

/// A named option (flag)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub name: String,
    pub value_type: ValueType,
    pub description: String,
    pub required: bool,
    pub choices: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub short: Option<char>,
    /// Explicit environment variable; when absent one is derived from the
    /// command path, see [`OptionSpec::env_var`].
    pub env_override: Option<String>,
}

impl OptionSpec {
    pub fn is_flag(&self) -> bool {
        self.value_type == ValueType::Boolean
    }

    /// Environment variable that can supply this option.
    ///
    /// `cli_name`, the command path, and the option name are joined in
    /// upper snake case: `mycli` / `["db", "migrate"]` / `dry-run` gives
    /// `MYCLI_DB_MIGRATE_DRY_RUN`.
    pub fn env_var(&self, cli_name: &str, path: &[String]) -> String {
        if let Some(explicit) = &self.env_override {
            return explicit.clone();
        }
        std::iter::once(cli_name)
            .chain(path.iter().map(String::as_str))
            .chain(std::iter::once(self.name.as_str()))
            .map(|segment| {
                segment
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() {
                            c.to_ascii_uppercase()
                        } else {
                            '_'
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// One command or subcommand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandNode {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    /// Alternative names, unique and in declaration order
    pub aliases: Vec<String>,
    pub hidden: bool,
    pub arguments: Vec<Argument>,
    pub options: Vec<OptionSpec>,
    pub subcommands: IndexMap<String, CommandNode>,
    pub lifecycle: Lifecycle,
    /// Ancestor names from the root, empty for top-level commands
    pub parent_path: Vec<String>,
    pub depth: usize,
}

impl CommandNode {
    /// Full path from the root, including this node
    pub fn path(&self) -> Vec<String> {
        let mut path = self.parent_path.clone();
        path.push(self.name.clone());
        path
    }

    pub fn is_group(&self) -> bool {
        !self.subcommands.is_empty()
    }
}

/// Root of the intermediate representation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ir {
    pub cli_name: String,
    pub version: String,
    pub tagline: String,
    pub description: Option<String>,
    pub global_options: Vec<OptionSpec>,
    pub commands: IndexMap<String, CommandNode>,
}

impl Ir {
    /// Every node, depth-first, siblings in insertion order (pre-order).
    pub fn walk(&self) -> Vec<&CommandNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&CommandNode> = self.commands.values().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.subcommands.values().rev());
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.walk().len()
    }

    /// Deepest `depth` value in the tree plus one, 0 for an empty tree
    pub fn max_depth(&self) -> usize {
        self.walk().iter().map(|n| n.depth + 1).max().unwrap_or(0)
    }

    /// Look up a node by its full path
    pub fn find(&self, path: &[String]) -> Option<&CommandNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.commands.get(first)?;
        for segment in rest {
            node = node.subcommands.get(segment)?;
        }
        Some(node)
    }

    /// Identifier-safe form of the CLI name (`my-cli` becomes `my_cli`)
    pub fn package_name(&self) -> String {
        self.cli_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}
