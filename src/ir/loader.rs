//! Reading CLI descriptions from disk
//!
//! Every supported format is converted into one neutral `serde_json::Value`
//! with document key order preserved, which is what the tree builder walks.

use crate::errors::{AppError, AppResult};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Source format of a CLI description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Yaml,
    Toml,
    Json,
}

impl InputFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(AppError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Load and parse a CLI description file
pub fn load_file(path: &Path) -> AppResult<Value> {
    if !path.exists() {
        return Err(AppError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = InputFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io_with_source(path, "read CLI description", e))?;
    debug!(path = %path.display(), ?format, bytes = content.len(), "loading CLI description");
    parse_str(&content, format)
}

/// Parse a CLI description from a string
pub fn parse_str(content: &str, format: InputFormat) -> AppResult<Value> {
    let value = match format {
        InputFormat::Yaml => serde_yaml::from_str::<Value>(content)?,
        InputFormat::Toml => toml::from_str::<Value>(content)?,
        InputFormat::Json => serde_json::from_str::<Value>(content)?,
    };
    Ok(value)
}

/// The `cli` mapping of a document, accepting both `{cli: {...}}` and the bare
/// mapping.
pub fn cli_section(document: &Value) -> Option<&Value> {
    match document.get("cli") {
        Some(cli) if cli.is_object() => Some(cli),
        _ if document.is_object() => Some(document),
        _ => None,
    }
}
