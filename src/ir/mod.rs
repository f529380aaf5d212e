//! Intermediate representation of a CLI
//!
//! `loader` reads a description file into a neutral value, `builder` checks
//! the tree rules and produces the immutable [`Ir`] defined in `model`.

pub mod builder;
pub mod loader;
pub mod model;

pub use builder::{TreeBuilder, DEFAULT_MAX_DEPTH};
pub use loader::{load_file, InputFormat};
pub use model::{Argument, CommandNode, Ir, Lifecycle, OptionSpec, ValueType};

use crate::errors::AppResult;
use std::path::Path;

/// Load a description file and build its tree in one step
pub fn build_from_file(path: &Path, max_depth: usize) -> AppResult<Ir> {
    let document = load_file(path)?;
    TreeBuilder::with_max_depth(max_depth).build(&document)
}
