//! cli-forge library
//!
//! This library turns one declarative CLI description into complete,
//! runnable command-line programs for several target languages.
//!
//! The pipeline is: [`ir`] builds an immutable command tree, [`hooks`]
//! computes the binding names each command looks up, [`render`] emits and
//! assembles artifacts per target, [`generator`] runs the targets (in parallel
//! when enabled) and [`writer`] puts the files on disk.

pub mod cli;
pub mod config;
pub mod errors;
pub mod generator;
pub mod hooks;
pub mod ir;
pub mod render;
pub mod writer;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigManager};
pub use errors::{AppError, AppResult};
pub use generator::{Generator, GeneratorSettings, TargetOutcome};
pub use ir::{Ir, TreeBuilder};
pub use render::{Artifact, RenderOptions, Renderer, RendererRegistry};
pub use writer::FileWriter;
