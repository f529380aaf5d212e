//! Built-in targets

pub mod nodejs;
pub mod python;
pub mod rust;
pub mod typescript;

use crate::errors::{AppError, AppResult};
use indexmap::IndexMap;

/// Output path of a layout component
pub(crate) fn layout_path(layout: &IndexMap<String, String>, component: &str) -> AppResult<String> {
    layout
        .get(component)
        .cloned()
        .ok_or_else(|| AppError::internal(format!("output layout has no '{component}' entry")))
}
