//! Artifact assembly
//!
//! Final checks on a target's artifact list (path hygiene, uniqueness,
//! executable bits, minimum output) and the create-if-absent merge policy.

use super::artifact::{Artifact, ArtifactKind, MergePolicy};
use crate::errors::{AppError, AppResult};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::warn;

/// Reject paths that are absolute, escape the output root or use `\`
pub fn validate_path(path: &str) -> AppResult<()> {
    if path.is_empty() {
        return Err(AppError::artifact_path(path, "path is empty"));
    }
    if path.contains('\\') {
        return Err(AppError::artifact_path(path, "path must use '/' separators"));
    }
    if path.starts_with('/') {
        return Err(AppError::artifact_path(path, "path must be relative"));
    }
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        return Err(AppError::artifact_path(path, "path must not carry a drive prefix"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(AppError::artifact_path(path, "path has an empty segment")),
            "." | ".." => {
                return Err(AppError::artifact_path(path, "path must not contain '.' or '..' segments"))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Check a renderer's output and stamp the target into every artifact.
///
/// Order is preserved. Fails when a path is invalid or repeated, when a
/// non-entry artifact is executable, or when the list lacks an entry point or
/// a bootstrap script.
pub fn assemble(target_id: &str, artifacts: Vec<Artifact>) -> AppResult<Vec<Artifact>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut assembled = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        validate_path(&artifact.path)?;
        if !seen.insert(artifact.path.clone()) {
            return Err(AppError::artifact_path(
                artifact.path.as_str(),
                "path produced more than once",
            ));
        }
        if artifact.executable && !artifact.kind().may_be_executable() {
            return Err(AppError::artifact_path(
                artifact.path.as_str(),
                format!("{} artifacts cannot be executable", artifact.kind()),
            ));
        }
        assembled.push(artifact.with_meta("target", target_id));
    }

    let has = |kind: ArtifactKind| assembled.iter().any(|a: &Artifact| a.kind() == kind);
    if !has(ArtifactKind::EntryPoint) {
        return Err(AppError::render(target_id, &[], "no entry-point artifact produced"));
    }
    if !has(ArtifactKind::Bootstrap) {
        return Err(AppError::render(target_id, &[], "no bootstrap artifact produced"));
    }
    Ok(assembled)
}

/// Collaborator query: does a relative output path already exist?
pub trait ExistingFiles: Send + Sync {
    fn exists(&self, relative_path: &str) -> bool;
}

/// Answers from the filesystem below an output root
#[derive(Debug, Clone)]
pub struct DiskExistingFiles {
    root: PathBuf,
}

impl DiskExistingFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExistingFiles for DiskExistingFiles {
    fn exists(&self, relative_path: &str) -> bool {
        self.root.join(relative_path).exists()
    }
}

/// Nothing exists yet
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExistingFiles;

impl ExistingFiles for NoExistingFiles {
    fn exists(&self, _relative_path: &str) -> bool {
        false
    }
}

impl ExistingFiles for BTreeSet<String> {
    fn exists(&self, relative_path: &str) -> bool {
        self.contains(relative_path)
    }
}

/// Artifacts to write plus the paths held back to protect user edits
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<String>,
}

/// Drop create-if-absent artifacts whose file already exists
pub fn apply_merge_policy(artifacts: Vec<Artifact>, existing: &dyn ExistingFiles) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for artifact in artifacts {
        if artifact.policy() == MergePolicy::CreateIfAbsent && existing.exists(&artifact.path) {
            warn!(path = %artifact.path, "keeping existing hook file");
            outcome.skipped.push(artifact.path);
        } else {
            outcome.artifacts.push(artifact);
        }
    }
    outcome
}
