//! Rendering: from a command tree to in-memory artifacts per target

pub mod artifact;
pub mod assembler;
pub mod context;
pub mod emitter;
pub mod registry;
pub mod targets;
pub mod templates;
pub mod traits;

pub use artifact::{Artifact, ArtifactKind, MergePolicy};
pub use assembler::{
    apply_merge_policy, assemble, validate_path, DiskExistingFiles, ExistingFiles, MergeOutcome,
    NoExistingFiles,
};
pub use registry::{RendererFactory, RendererRegistry};
pub use templates::TemplateEngine;
pub use traits::{CustomFilter, EmitContext, Fragment, RenderOptions, Renderer};
