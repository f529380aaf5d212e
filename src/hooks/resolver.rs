//! Hook name resolution
//!
//! Maps a command path to the ordered list of binding names a generated
//! runtime tries, most specific first. Resolution is a pure function of the
//! path, the naming convention and the abbreviation threshold.

use super::naming::NamingConvention;
use crate::errors::{AppError, AppResult};
use crate::ir::{CommandNode, Ir, Lifecycle};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

/// Paths longer than this get an abbreviated canonical name by default
pub const DEFAULT_HOOK_THRESHOLD: usize = 3;

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every segment joined
    Exact,
    /// First and last segment, for paths of three or more
    Abbreviated,
    /// Last two segments, or the only one
    Namespaced,
    /// The shared catch-all binding
    Generic,
}

impl Strategy {
    /// The default chain, in the order candidates are tried
    pub const CHAIN: [Strategy; 4] = [
        Strategy::Exact,
        Strategy::Abbreviated,
        Strategy::Namespaced,
        Strategy::Generic,
    ];

    /// Segments this strategy keeps, `None` when it does not apply to the
    /// path or does not name segments at all.
    pub fn segments(&self, path: &[String]) -> Option<Vec<String>> {
        let n = path.len();
        if n == 0 {
            return None;
        }
        match self {
            Strategy::Exact => Some(path.to_vec()),
            Strategy::Abbreviated if n >= 3 => Some(vec![path[0].clone(), path[n - 1].clone()]),
            Strategy::Abbreviated => None,
            Strategy::Namespaced if n == 1 => Some(vec![path[0].clone()]),
            Strategy::Namespaced => Some(path[n - 2..].to_vec()),
            Strategy::Generic => None,
        }
    }
}

/// Resolved names for one action of a managed controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionBinding {
    pub action: String,
    /// Callable candidates for `path + [action]`, generic fallback last
    pub candidate_names: Vec<String>,
}

/// Controller lookup for a managed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerBinding {
    pub canonical_name: String,
    /// Controller object names; there is no generic controller
    pub candidate_names: Vec<String>,
    pub actions: Vec<ActionBinding>,
}

/// Computed binding for one command path; recomputed on every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookBinding {
    pub command_path: Vec<String>,
    /// The name a generated stub defines for this command
    pub canonical_name: String,
    pub candidate_names: Vec<String>,
    pub controller: Option<ControllerBinding>,
}

impl HookBinding {
    pub fn is_managed(&self) -> bool {
        self.controller.is_some()
    }

    /// The name the stub file defines: the controller for managed commands,
    /// the canonical callable otherwise.
    pub fn defined_name(&self) -> &str {
        self.controller
            .as_ref()
            .map_or(self.canonical_name.as_str(), |c| c.canonical_name.as_str())
    }
}

/// Resolver for one target's naming convention
#[derive(Debug, Clone)]
pub struct HookResolver {
    naming: NamingConvention,
    threshold: usize,
    chain: Vec<Strategy>,
}

impl HookResolver {
    pub fn new(naming: NamingConvention, threshold: usize) -> Self {
        Self {
            naming,
            threshold: threshold.max(1),
            chain: Strategy::CHAIN.to_vec(),
        }
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Candidate callable names for `path`, most specific first, duplicates
    /// removed and the generic fallback always last.
    pub fn resolve(&self, path: &[String]) -> Vec<String> {
        let mut names = IndexSet::new();
        for strategy in &self.chain {
            match strategy {
                Strategy::Generic => {
                    names.insert(self.naming.generic().to_string());
                }
                other => {
                    if let Some(segments) = other.segments(path) {
                        names.insert(self.naming.callable(&segments));
                    }
                }
            }
        }
        names.into_iter().collect()
    }

    /// The single name a stub defines for `path`: the exact join within the
    /// threshold, the abbreviated one beyond it.
    pub fn canonical_name(&self, path: &[String]) -> String {
        let strategy = if path.len() > self.threshold {
            Strategy::Abbreviated
        } else {
            Strategy::Exact
        };
        let segments = strategy
            .segments(path)
            .unwrap_or_else(|| path.to_vec());
        self.naming.callable(&segments)
    }

    /// Controller object candidates for a managed command
    pub fn controller_candidates(&self, path: &[String]) -> Vec<String> {
        let mut names = IndexSet::new();
        for strategy in &self.chain {
            if let Some(segments) = strategy.segments(path) {
                names.insert(self.naming.controller(&segments));
            }
        }
        names.into_iter().collect()
    }

    fn controller_binding(&self, path: &[String]) -> ControllerBinding {
        let actions = Lifecycle::ACTIONS
            .iter()
            .map(|action| {
                let mut action_path = path.to_vec();
                action_path.push(action.to_string());
                ActionBinding {
                    action: action.to_string(),
                    candidate_names: self.resolve(&action_path),
                }
            })
            .collect();
        ControllerBinding {
            canonical_name: self.naming.controller(path),
            candidate_names: self.controller_candidates(path),
            actions,
        }
    }

    /// Full binding for a path with a given lifecycle
    pub fn binding(&self, path: &[String], lifecycle: Lifecycle) -> HookBinding {
        HookBinding {
            command_path: path.to_vec(),
            canonical_name: self.canonical_name(path),
            candidate_names: self.resolve(path),
            controller: lifecycle
                .is_managed()
                .then(|| self.controller_binding(path)),
        }
    }

    pub fn binding_for(&self, node: &CommandNode) -> HookBinding {
        self.binding(&node.path(), node.lifecycle)
    }
}

/// Bindings for every node of a tree, in walk order.
///
/// Names a stub defines must be unique across the tree. When two deep paths
/// abbreviate alike, both fall back to their exact name; a clash that
/// survives that (`a-b` at the root and `a b` nested) is an error.
#[derive(Debug, Clone, Serialize)]
pub struct HookIndex {
    bindings: IndexMap<Vec<String>, HookBinding>,
}

impl HookIndex {
    /// # Errors
    ///
    /// `HookNameCollision` naming the first two paths, in walk order, that
    /// would define the same stub.
    pub fn build(ir: &Ir, resolver: &HookResolver) -> AppResult<Self> {
        let mut bindings: IndexMap<Vec<String>, HookBinding> = ir
            .walk()
            .into_iter()
            .map(|node| {
                let binding = resolver.binding_for(node);
                (binding.command_path.clone(), binding)
            })
            .collect();

        for (name, paths) in owners(&bindings) {
            if paths.len() < 2 || paths.iter().all(|p| p.len() <= resolver.threshold()) {
                continue;
            }
            debug!(%name, count = paths.len(), "canonical hook name shared, using exact names");
            for path in paths {
                if let Some(binding) = bindings.get_mut(&path) {
                    binding.canonical_name = resolver.naming().callable(&path);
                }
            }
        }

        if let Some((name, mut paths)) = owners(&bindings).into_iter().find(|(_, p)| p.len() > 1) {
            let path = paths.swap_remove(1);
            let first = paths.swap_remove(0);
            return Err(AppError::HookNameCollision { name, first, path });
        }

        Ok(Self { bindings })
    }

    pub fn get(&self, path: &[String]) -> Option<&HookBinding> {
        self.bindings.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Paths grouped by the name their stub defines, in walk order
fn owners(bindings: &IndexMap<Vec<String>, HookBinding>) -> IndexMap<String, Vec<Vec<String>>> {
    let mut owners: IndexMap<String, Vec<Vec<String>>> = IndexMap::new();
    for (path, binding) in bindings {
        owners
            .entry(binding.defined_name().to_string())
            .or_default()
            .push(path.clone());
    }
    owners
}
