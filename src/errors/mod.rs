//! Typed errors for the generation core
//!
//! The library returns `AppResult`; only the binary's handlers switch to
//! `anyhow` for reporting.

pub mod context;
pub mod types;

pub use context::ErrorContextExt;
pub use types::{display_path, AppError, AppResult};
