//! Hook name resolution for generated CLIs
//!
//! Every command in a generated CLI ends up calling user code through a
//! binding name. This module computes those names: `naming` holds the
//! per-language spelling rules and `resolver` the fallback chain that turns a
//! command path into ordered candidates.

pub mod naming;
pub mod resolver;

pub use naming::{CaseStyle, NamingConvention};
pub use resolver::{
    ActionBinding, ControllerBinding, HookBinding, HookIndex, HookResolver, Strategy,
    DEFAULT_HOOK_THRESHOLD,
};
