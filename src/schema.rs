//! Output document types for zip-meta-map
//!
//! Defines the serde types behind `META_ZIP_INDEX.json` and the optional
//! `META_ZIP_POLICY.json` input, plus the format constants shared across the
//! crate. Optional fields are modeled as `Option<T>` and omitted from the
//! serialized document when absent, so the JSON shape stays dict-like.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Literal `format` tag on every index document
pub const INDEX_FORMAT: &str = "zip-meta-map";

/// Index document spec version
pub const INDEX_VERSION: &str = "0.2";

/// `generated_by` tag; deliberately timestamp-free so repeated builds of the
/// same tree serialize byte-identically
pub const GENERATED_BY: &str = concat!("zip-meta-map/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Roles
// ============================================================================

/// Classification role for a scanned file
///
/// Serialized as snake_case strings (`public_api`, `doc_architecture`, ...).
/// Declaration order is significant: it is the tie-break order used when
/// ranking primary roles within a module summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Entrypoint,
    PublicApi,
    Source,
    Internal,
    Config,
    Lockfile,
    Ci,
    Test,
    Fixture,
    Doc,
    DocApi,
    DocArchitecture,
    Schema,
    Build,
    Script,
    Generated,
    Vendor,
    Asset,
    Data,
    #[default]
    Unknown,
}

impl Role {
    /// All roles in declaration order
    pub const ALL: [Role; 20] = [
        Role::Entrypoint,
        Role::PublicApi,
        Role::Source,
        Role::Internal,
        Role::Config,
        Role::Lockfile,
        Role::Ci,
        Role::Test,
        Role::Fixture,
        Role::Doc,
        Role::DocApi,
        Role::DocArchitecture,
        Role::Schema,
        Role::Build,
        Role::Script,
        Role::Generated,
        Role::Vendor,
        Role::Asset,
        Role::Data,
        Role::Unknown,
    ];

    /// The snake_case wire name of this role
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Entrypoint => "entrypoint",
            Role::PublicApi => "public_api",
            Role::Source => "source",
            Role::Internal => "internal",
            Role::Config => "config",
            Role::Lockfile => "lockfile",
            Role::Ci => "ci",
            Role::Test => "test",
            Role::Fixture => "fixture",
            Role::Doc => "doc",
            Role::DocApi => "doc_api",
            Role::DocArchitecture => "doc_architecture",
            Role::Schema => "schema",
            Role::Build => "build",
            Role::Script => "script",
            Role::Generated => "generated",
            Role::Vendor => "vendor",
            Role::Asset => "asset",
            Role::Data => "data",
            Role::Unknown => "unknown",
        }
    }

    /// Human-readable label used in module summary prose
    pub fn label(self) -> &'static str {
        match self {
            Role::Entrypoint => "entry point",
            Role::PublicApi => "public API surface",
            Role::Source => "source code",
            Role::Internal => "internal modules",
            Role::Config => "configuration",
            Role::Lockfile => "lock files",
            Role::Ci => "CI/CD pipelines",
            Role::Test => "tests",
            Role::Fixture => "test fixtures",
            Role::Doc => "documentation",
            Role::DocApi => "API documentation",
            Role::DocArchitecture => "architecture docs",
            Role::Schema => "schema definitions",
            Role::Build => "build scripts",
            Role::Script => "utility scripts",
            Role::Generated => "generated output",
            Role::Vendor => "vendored dependencies",
            Role::Asset => "static assets",
            Role::Data => "data files",
            Role::Unknown => "unclassified files",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Risk flags
// ============================================================================

/// Heuristic per-file risk signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    PathTraversal,
    BinaryExecutable,
    BinaryMasquerade,
    ExecShell,
    SecretsLike,
    NetworkIo,
}

impl RiskFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskFlag::PathTraversal => "path_traversal",
            RiskFlag::BinaryExecutable => "binary_executable",
            RiskFlag::BinaryMasquerade => "binary_masquerade",
            RiskFlag::ExecShell => "exec_shell",
            RiskFlag::SecretsLike => "secrets_like",
            RiskFlag::NetworkIo => "network_io",
        }
    }
}

impl std::fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Index document
// ============================================================================

/// One chunk of a large text file
///
/// Line numbers are 1-based and inclusive; for a given file the ordered chunk
/// list partitions the full line range with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub id: String,
    pub start_line: usize,
    pub end_line: usize,
    pub byte_len: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
}

/// One entry in the index `files` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub role: Role,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<ChunkInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_flags: Option<Vec<RiskFlag>>,
}

impl Default for FileEntry {
    fn default() -> Self {
        Self {
            path: String::new(),
            size_bytes: 0,
            sha256: String::new(),
            role: Role::Unknown,
            confidence: 0.0,
            reason: None,
            chunks: None,
            excerpt: None,
            risk_flags: None,
        }
    }
}

impl FileEntry {
    /// True if this entry carries the given risk flag
    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.risk_flags
            .as_deref()
            .is_some_and(|flags| flags.contains(&flag))
    }
}

/// Directory-level aggregate summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub path: String,
    pub file_count: usize,
    pub total_bytes: u64,
    pub primary_roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A named navigation plan supplied by the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub description: String,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_after: Option<Vec<String>>,
}

/// The top-level `META_ZIP_INDEX.json` document
///
/// Created once per build and never mutated afterwards. Deserialization is
/// lenient (missing optional sections default to empty) so older documents
/// can still be diffed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Index {
    pub format: String,
    pub version: String,
    pub generated_by: String,
    pub profile: String,
    pub start_here: Vec<String>,
    pub ignore: Vec<String>,
    pub files: Vec<FileEntry>,
    pub plans: BTreeMap<String, Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<ModuleSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_applied: Option<bool>,
}

impl Index {
    /// Look up a file entry by path
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Serialize the document as pretty JSON with a trailing newline
    pub fn to_json_pretty(&self) -> String {
        let mut json = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        json.push('\n');
        json
    }
}

// ============================================================================
// Policy document
// ============================================================================

/// Optional `META_ZIP_POLICY.json` override document (input only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub format: Option<String>,
    pub version: Option<String>,
    /// Extra ignore globs merged into the effective ignore set before scanning
    pub ignore_extra: Vec<String>,
    /// Per-plan byte budget overrides (applied to `max_total_bytes`)
    pub plan_budgets: BTreeMap<String, u64>,
    pub never_read: Vec<String>,
    pub read_only: Vec<String>,
    pub sensitive: Vec<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_snake_case() {
        let json = serde_json::to_string(&Role::DocArchitecture).unwrap();
        assert_eq!(json, "\"doc_architecture\"");
        let back: Role = serde_json::from_str("\"public_api\"").unwrap();
        assert_eq!(back, Role::PublicApi);
    }

    #[test]
    fn role_all_covers_every_wire_name_once() {
        let names: std::collections::BTreeSet<&str> =
            Role::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(names.len(), Role::ALL.len());
        assert!(names.contains("unknown"));
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let entry = FileEntry {
            path: "a.txt".to_string(),
            size_bytes: 5,
            sha256: "0".repeat(64),
            role: Role::Doc,
            confidence: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("chunks"));
        assert!(!json.contains("risk_flags"));
        assert!(!json.contains("excerpt"));
    }

    #[test]
    fn index_deserialization_tolerates_missing_sections() {
        let doc = r#"{"format":"zip-meta-map","version":"0.2","profile":"python_cli","files":[]}"#;
        let index: Index = serde_json::from_str(doc).unwrap();
        assert_eq!(index.profile, "python_cli");
        assert!(index.start_here.is_empty());
        assert!(index.modules.is_none());
    }

    #[test]
    fn policy_parses_with_partial_fields() {
        let doc = r#"{"format":"zip-meta-policy","ignore_extra":["secrets/**"]}"#;
        let policy: Policy = serde_json::from_str(doc).unwrap();
        assert_eq!(policy.ignore_extra, vec!["secrets/**".to_string()]);
        assert!(policy.plan_budgets.is_empty());
    }
}
