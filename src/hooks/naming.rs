//! Per-target naming conventions for binding names
//!
//! Command path segments are normalised into lowercase words first; each
//! convention then joins those words its own way.

use serde::Serialize;

/// Split one path segment into lowercase words.
///
/// Separators are `-`, `_`, `.` and whitespace; runs of separators collapse.
pub fn split_words(segment: &str) -> Vec<String> {
    segment
        .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Snake-case identifier for a segment; `foo-bar` and `foo_bar` agree
pub fn normalized_identifier(segment: &str) -> String {
    split_words(segment).join("_")
}

/// Uppercase the first character
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// PascalCase join of every word of every segment
pub fn pascal_case(segments: &[String]) -> String {
    segments
        .iter()
        .flat_map(|segment| split_words(segment))
        .map(|word| capitalize(&word))
        .collect()
}

/// snake_case join of every word of every segment
pub fn snake_case(segments: &[String]) -> String {
    segments
        .iter()
        .flat_map(|segment| split_words(segment))
        .collect::<Vec<_>>()
        .join("_")
}

/// How a target spells identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStyle {
    /// `on_db_migrate`
    Snake,
    /// `onDbMigrate`
    Camel,
}

/// Binding-name rules for one target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamingConvention {
    pub style: CaseStyle,
    /// Marker in front of every callable binding
    pub prefix: &'static str,
    /// Catch-all binding shared by every unmatched command
    pub generic: &'static str,
    /// Appended to PascalCase paths for managed controllers
    pub controller_suffix: &'static str,
}

impl NamingConvention {
    /// Python and Rust
    pub const SNAKE: Self = Self {
        style: CaseStyle::Snake,
        prefix: "on",
        generic: "on_command_executed",
        controller_suffix: "Controller",
    };

    /// Node.js and TypeScript
    pub const CAMEL: Self = Self {
        style: CaseStyle::Camel,
        prefix: "on",
        generic: "onCommandExecuted",
        controller_suffix: "Controller",
    };

    /// Callable binding name for a run of path segments
    pub fn callable(&self, segments: &[String]) -> String {
        match self.style {
            CaseStyle::Snake => format!("{}_{}", self.prefix, snake_case(segments)),
            CaseStyle::Camel => format!("{}{}", self.prefix, pascal_case(segments)),
        }
    }

    /// Controller binding name for a run of path segments
    pub fn controller(&self, segments: &[String]) -> String {
        format!("{}{}", pascal_case(segments), self.controller_suffix)
    }

    pub fn generic(&self) -> &'static str {
        self.generic
    }

    /// Identifier for a parameter or variable in generated code
    pub fn parameter(&self, name: &str) -> String {
        match self.style {
            CaseStyle::Snake => normalized_identifier(name),
            CaseStyle::Camel => {
                let words = split_words(name);
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(word);
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("db-migrate"), vec!["db", "migrate"]);
        assert_eq!(split_words("Foo__Bar.baz qux"), vec!["foo", "bar", "baz", "qux"]);
        assert!(split_words("--").is_empty());
    }

    #[test]
    fn test_normalized_identifier_collapses_separators() {
        assert_eq!(normalized_identifier("foo-bar"), normalized_identifier("foo_bar"));
        assert_eq!(normalized_identifier("Foo.Bar"), "foo_bar");
    }

    #[test]
    fn test_snake_convention() {
        let naming = NamingConvention::SNAKE;
        assert_eq!(naming.callable(&segs(&["hello"])), "on_hello");
        assert_eq!(naming.callable(&segs(&["db", "run-migrations"])), "on_db_run_migrations");
        assert_eq!(naming.controller(&segs(&["server"])), "ServerController");
        assert_eq!(naming.generic(), "on_command_executed");
        assert_eq!(naming.parameter("dry-run"), "dry_run");
    }

    #[test]
    fn test_camel_convention() {
        let naming = NamingConvention::CAMEL;
        assert_eq!(naming.callable(&segs(&["hello"])), "onHello");
        assert_eq!(naming.callable(&segs(&["db", "run-migrations"])), "onDbRunMigrations");
        assert_eq!(naming.controller(&segs(&["api", "server"])), "ApiServerController");
        assert_eq!(naming.generic(), "onCommandExecuted");
        assert_eq!(naming.parameter("dry-run"), "dryRun");
    }
}
