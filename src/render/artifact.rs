use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Role of a generated file within its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// The generated CLI program itself
    EntryPoint,
    /// Setup script that installs the generated CLI
    Bootstrap,
    /// Package manifest (`pyproject.toml`, `package.json`, `Cargo.toml`)
    Manifest,
    /// File the user fills with their hook implementations
    HookStub,
    /// Any other supporting file
    Support,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntryPoint => "entry-point",
            Self::Bootstrap => "bootstrap",
            Self::Manifest => "manifest",
            Self::HookStub => "hook-stub",
            Self::Support => "support",
        }
    }

    /// Only entry points and setup scripts may carry the executable bit
    pub fn may_be_executable(&self) -> bool {
        matches!(self, Self::EntryPoint | Self::Bootstrap)
    }

    /// Hook stubs are owned by the user once they exist
    pub fn default_policy(&self) -> MergePolicy {
        match self {
            Self::HookStub => MergePolicy::CreateIfAbsent,
            _ => MergePolicy::Always,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when the file already exists on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Regenerated on every run
    Always,
    /// Written only when missing so user edits survive
    CreateIfAbsent,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::CreateIfAbsent => "create-if-absent",
        }
    }
}

/// One generated output file. Immutable once a render pass returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Relative, `/`-separated, no `..` segments
    pub path: String,
    pub content: String,
    pub executable: bool,
    /// `target`, `component`, `policy` and `kind`, sorted by key
    pub metadata: BTreeMap<String, String>,
    #[serde(skip)]
    kind: ArtifactKind,
    #[serde(skip)]
    policy: MergePolicy,
}

impl Artifact {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        kind: ArtifactKind,
        component: &str,
    ) -> Self {
        let policy = kind.default_policy();
        let mut metadata = BTreeMap::new();
        metadata.insert("component".to_string(), component.to_string());
        metadata.insert("kind".to_string(), kind.as_str().to_string());
        metadata.insert("policy".to_string(), policy.as_str().to_string());
        Self {
            path: path.into(),
            content: content.into(),
            executable: false,
            metadata,
            kind,
            policy,
        }
    }

    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn component(&self) -> Option<&str> {
        self.metadata.get("component").map(String::as_str)
    }

    pub fn target(&self) -> Option<&str> {
        self.metadata.get("target").map(String::as_str)
    }
}
