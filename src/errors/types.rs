//! Error types for the cli-forge generation core
//!
//! Variants are grouped by the phase that raises them: tree construction,
//! target selection, rendering, artifact assembly, and the ambient concerns
//! (configuration, input parsing, I/O).

use std::path::PathBuf;
use thiserror::Error;

/// Render a command path the way every error message shows it.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" ")
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Tree construction errors
    #[error("Schema error at '{}': {reason}", display_path(.path))]
    Schema { path: Vec<String>, reason: String },

    #[error("Duplicate command at '{}'", display_path(.path))]
    DuplicateCommand { path: Vec<String> },

    #[error("Command '{}' exceeds the maximum nesting depth of {limit}", display_path(.path))]
    DepthLimitExceeded { path: Vec<String>, limit: usize },

    #[error(
        "Commands '{}' and '{}' both define hook '{name}'",
        display_path(.first),
        display_path(.path)
    )]
    HookNameCollision {
        name: String,
        first: Vec<String>,
        path: Vec<String>,
    },

    // Target selection
    #[error("Unsupported target '{target_id}' (available: {})", .available.join(", "))]
    UnsupportedTarget {
        target_id: String,
        available: Vec<String>,
    },

    // Rendering
    #[error("Render failed for target '{target_id}' at '{}': {message}", display_path(.path))]
    Render {
        target_id: String,
        path: Vec<String>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid artifact path '{path}': {reason}")]
    ArtifactPath { path: String, reason: String },

    // Template processing
    #[error("Template error: {message}")]
    Template {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template syntax error in '{template_name}': {reason}")]
    TemplateSyntax {
        template_name: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidConfigValue { key: String, value: String },

    #[error("Unknown configuration key: {key}")]
    UnknownConfigKey { key: String },

    // Input parsing
    #[error("JSON error: {context}")]
    Json {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("YAML parsing error: {context}")]
    YamlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported input format '{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // I/O
    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // Generic/catch-all errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new Schema error for the given command path
    pub fn schema(path: &[String], reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create a new Render error
    pub fn render(
        target_id: impl Into<String>,
        path: &[String],
        message: impl Into<String>,
    ) -> Self {
        Self::Render {
            target_id: target_id.into(),
            path: path.to_vec(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new ArtifactPath error
    pub fn artifact_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArtifactPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error
    pub fn io(path: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: None,
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Template error with source
    pub fn template_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Template {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Re-tag an error raised while rendering a node as a target-level render
    /// failure. Errors that already are render failures keep their own path.
    pub fn into_render(self, target_id: &str, path: &[String]) -> Self {
        match self {
            Self::Render { .. } => self,
            other => Self::Render {
                target_id: target_id.to_string(),
                path: path.to_vec(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Command path the error points at, if any.
    pub fn command_path(&self) -> Option<&[String]> {
        match self {
            Self::Schema { path, .. }
            | Self::DuplicateCommand { path }
            | Self::DepthLimitExceeded { path, .. }
            | Self::HookNameCollision { path, .. }
            | Self::Render { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Tree construction and target selection errors abort the whole run;
    /// everything else is confined to the target that raised it.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Schema { .. }
                | Self::DuplicateCommand { .. }
                | Self::DepthLimitExceeded { .. }
                | Self::UnsupportedTarget { .. }
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::DuplicateCommand { .. }
            | Self::DepthLimitExceeded { .. }
            | Self::HookNameCollision { .. } => "tree",
            Self::UnsupportedTarget { .. } => "target",
            Self::Render { .. } | Self::ArtifactPath { .. } => "render",
            Self::Template { .. } | Self::TemplateNotFound { .. } | Self::TemplateSyntax { .. } => {
                "template"
            }
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::UnknownConfigKey { .. } => {
                "config"
            }
            Self::Json { .. }
            | Self::YamlParsing { .. }
            | Self::TomlParsing { .. }
            | Self::UnsupportedFormat { .. } => "input",
            Self::Io { .. } | Self::FileNotFound { .. } => "io",
            Self::Internal { .. } | Self::Other { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::NotFound => "file not found",
            std::io::ErrorKind::PermissionDenied => "permission denied",
            std::io::ErrorKind::AlreadyExists => "already exists",
            _ => "I/O operation",
        }
        .to_string();

        Self::Io {
            path: PathBuf::from("unknown"),
            operation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let context = if err.is_syntax() || err.is_eof() {
            format!("syntax error at line {} column {}", err.line(), err.column())
        } else {
            err.to_string()
        };
        Self::Json {
            context,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        let context = match err.location() {
            Some(loc) => format!("line {} column {}: {}", loc.line(), loc.column(), err),
            None => err.to_string(),
        };
        Self::YamlParsing {
            context,
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlParsing {
            context: err.message().to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<handlebars::TemplateError> for AppError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::TemplateSyntax {
            template_name: err.name().map(|s| s.to_string()).unwrap_or_else(|| "<inline>".to_string()),
            reason: err.reason().to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = AppError::DuplicateCommand {
            path: path(&["db", "migrate"]),
        };
        assert_eq!(err.to_string(), "Duplicate command at 'db migrate'");

        let err = AppError::schema(&[], "missing 'name'");
        assert_eq!(err.to_string(), "Schema error at '<root>': missing 'name'");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(AppError::schema(&path(&["a"]), "x").category(), "schema");
        assert_eq!(AppError::render("python", &path(&["a"]), "x").category(), "render");
        assert_eq!(AppError::config("x").category(), "config");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::DepthLimitExceeded { path: path(&["a"]), limit: 1 }.is_fatal_for_run());
        assert!(AppError::UnsupportedTarget {
            target_id: "cobol".into(),
            available: vec![]
        }
        .is_fatal_for_run());
        assert!(!AppError::render("rust", &path(&["a"]), "boom").is_fatal_for_run());
    }

    #[test]
    fn test_into_render_keeps_existing_render_path() {
        let original = AppError::render("python", &path(&["a", "b"]), "bad");
        let retagged = original.into_render("python", &path(&["a"]));
        assert_eq!(retagged.command_path(), Some(&path(&["a", "b"])[..]));

        let wrapped = AppError::template("oops").into_render("rust", &path(&["x"]));
        match wrapped {
            AppError::Render { target_id, path: p, .. } => {
                assert_eq!(target_id, "rust");
                assert_eq!(p, path(&["x"]));
            }
            other => panic!("Expected Render, got {other:?}"),
        }
    }

    #[test]
    fn test_template_syntax_error_keeps_template_name() {
        let mut registry = handlebars::Handlebars::new();
        let err: AppError = registry
            .register_template_string("python/cli", "{{#if ok}}never closed")
            .unwrap_err()
            .into();
        match err {
            AppError::TemplateSyntax { template_name, .. } => assert_eq!(template_name, "python/cli"),
            other => panic!("Expected TemplateSyntax, got {other:?}"),
        }
    }

    #[test]
    fn test_hook_collision_points_at_second_path() {
        let err = AppError::HookNameCollision {
            name: "on_a_b".into(),
            first: path(&["a-b"]),
            path: path(&["a", "b"]),
        };
        assert_eq!(err.command_path(), Some(&path(&["a", "b"])[..]));
        assert_eq!(err.category(), "tree");
        assert!(err.to_string().contains("'a-b' and 'a b'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();

        match app_err {
            AppError::Io { operation, .. } => assert_eq!(operation, "file not found"),
            _ => panic!("Wrong error type"),
        }
    }
}
