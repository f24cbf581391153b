//! Structural index diffing
//!
//! Compares two index documents section by section and reports what a
//! reviewer actually cares about: file set membership, per-file role /
//! content / confidence / risk drift, and changes to the start-here list,
//! plans, capabilities, warnings, and module summaries. Excerpts and chunk
//! maps are deliberately not compared; "content changed" already covers
//! anything they would reveal.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{MetaMapError, Result};
use crate::schema::{FileEntry, Index, ModuleSummary, Plan};

// ============================================================================
// Result types
// ============================================================================

/// What changed about a single file present in both indices
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub changes: Vec<String>,
}

/// Section-by-section comparison of two index documents
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    pub files_added: Vec<String>,
    pub files_removed: Vec<String>,
    pub files_modified: Vec<FileChange>,
    pub profile_changed: Option<(String, String)>,
    pub start_here_added: Vec<String>,
    pub start_here_removed: Vec<String>,
    pub plans_added: Vec<String>,
    pub plans_removed: Vec<String>,
    pub plans_modified: Vec<String>,
    pub capabilities_added: Vec<String>,
    pub capabilities_removed: Vec<String>,
    pub warnings_added: Vec<String>,
    pub warnings_removed: Vec<String>,
    pub modules_added: Vec<String>,
    pub modules_removed: Vec<String>,
    pub modules_modified: Vec<String>,
}

impl DiffResult {
    /// True if any difference was detected
    pub fn has_changes(&self) -> bool {
        !(self.files_added.is_empty()
            && self.files_removed.is_empty()
            && self.files_modified.is_empty()
            && self.profile_changed.is_none()
            && self.start_here_added.is_empty()
            && self.start_here_removed.is_empty()
            && self.plans_added.is_empty()
            && self.plans_removed.is_empty()
            && self.plans_modified.is_empty()
            && self.capabilities_added.is_empty()
            && self.capabilities_removed.is_empty()
            && self.warnings_added.is_empty()
            && self.warnings_removed.is_empty()
            && self.modules_added.is_empty()
            && self.modules_removed.is_empty()
            && self.modules_modified.is_empty())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read an index document from disk
pub fn load_index(path: &Path) -> Result<Index> {
    if !path.exists() {
        return Err(MetaMapError::InputNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| MetaMapError::InvalidIndex {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// ============================================================================
// Comparison
// ============================================================================

fn compare_file_entries(old: &FileEntry, new: &FileEntry) -> Vec<String> {
    let mut changes = Vec::new();

    if old.sha256 != new.sha256 {
        changes.push("content changed".to_string());
    }
    if old.role != new.role {
        changes.push(format!("role: {} -> {}", old.role, new.role));
    }
    if old.size_bytes != new.size_bytes {
        changes.push(format!("size: {} -> {}", old.size_bytes, new.size_bytes));
    }
    if old.confidence != new.confidence {
        changes.push(format!(
            "confidence: {} -> {}",
            old.confidence, new.confidence
        ));
    }

    let old_flags: BTreeSet<String> = old
        .risk_flags
        .iter()
        .flatten()
        .map(|f| f.as_str().to_string())
        .collect();
    let new_flags: BTreeSet<String> = new
        .risk_flags
        .iter()
        .flatten()
        .map(|f| f.as_str().to_string())
        .collect();
    let added: Vec<&str> = new_flags.difference(&old_flags).map(String::as_str).collect();
    let removed: Vec<&str> = old_flags.difference(&new_flags).map(String::as_str).collect();
    if !added.is_empty() {
        changes.push(format!("risk_flags added: {}", added.join(", ")));
    }
    if !removed.is_empty() {
        changes.push(format!("risk_flags removed: {}", removed.join(", ")));
    }

    changes
}

fn plans_equal(old: &Plan, new: &Plan) -> bool {
    old.description == new.description
        && old.steps == new.steps
        && old.budget_bytes == new.budget_bytes
        && old.max_total_bytes == new.max_total_bytes
        && old.stop_after == new.stop_after
}

fn modules_equal(old: &ModuleSummary, new: &ModuleSummary) -> bool {
    old.file_count == new.file_count
        && old.primary_roles == new.primary_roles
        && old.summary == new.summary
        && old.total_bytes == new.total_bytes
}

fn set_diff(old: &BTreeSet<String>, new: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    let added = new.difference(old).cloned().collect();
    let removed = old.difference(new).cloned().collect();
    (added, removed)
}

/// Compare two index documents
pub fn diff_indices(old: &Index, new: &Index) -> DiffResult {
    let mut result = DiffResult::default();

    if old.profile != new.profile {
        result.profile_changed = Some((old.profile.clone(), new.profile.clone()));
    }

    let old_files: BTreeMap<&str, &FileEntry> =
        old.files.iter().map(|f| (f.path.as_str(), f)).collect();
    let new_files: BTreeMap<&str, &FileEntry> =
        new.files.iter().map(|f| (f.path.as_str(), f)).collect();

    for (path, entry) in &new_files {
        match old_files.get(path) {
            None => result.files_added.push((*path).to_string()),
            Some(old_entry) => {
                let changes = compare_file_entries(old_entry, entry);
                if !changes.is_empty() {
                    result.files_modified.push(FileChange {
                        path: (*path).to_string(),
                        changes,
                    });
                }
            }
        }
    }
    for path in old_files.keys() {
        if !new_files.contains_key(path) {
            result.files_removed.push((*path).to_string());
        }
    }

    let old_sh: BTreeSet<String> = old.start_here.iter().cloned().collect();
    let new_sh: BTreeSet<String> = new.start_here.iter().cloned().collect();
    (result.start_here_added, result.start_here_removed) = set_diff(&old_sh, &new_sh);

    for (name, plan) in &new.plans {
        match old.plans.get(name) {
            None => result.plans_added.push(name.clone()),
            Some(old_plan) => {
                if !plans_equal(old_plan, plan) {
                    result.plans_modified.push(name.clone());
                }
            }
        }
    }
    for name in old.plans.keys() {
        if !new.plans.contains_key(name) {
            result.plans_removed.push(name.clone());
        }
    }

    let old_caps: BTreeSet<String> = old.capabilities.iter().flatten().cloned().collect();
    let new_caps: BTreeSet<String> = new.capabilities.iter().flatten().cloned().collect();
    (result.capabilities_added, result.capabilities_removed) = set_diff(&old_caps, &new_caps);

    let old_warns: BTreeSet<String> = old.warnings.iter().flatten().cloned().collect();
    let new_warns: BTreeSet<String> = new.warnings.iter().flatten().cloned().collect();
    (result.warnings_added, result.warnings_removed) = set_diff(&old_warns, &new_warns);

    let old_mods: BTreeMap<&str, &ModuleSummary> = old
        .modules
        .iter()
        .flatten()
        .map(|m| (m.path.as_str(), m))
        .collect();
    let new_mods: BTreeMap<&str, &ModuleSummary> = new
        .modules
        .iter()
        .flatten()
        .map(|m| (m.path.as_str(), m))
        .collect();
    for (path, module) in &new_mods {
        match old_mods.get(path) {
            None => result.modules_added.push((*path).to_string()),
            Some(old_module) => {
                if !modules_equal(old_module, module) {
                    result.modules_modified.push((*path).to_string());
                }
            }
        }
    }
    for path in old_mods.keys() {
        if !new_mods.contains_key(path) {
            result.modules_removed.push((*path).to_string());
        }
    }

    result
}

// ============================================================================
// Rendering
// ============================================================================

fn count_line(label: &str, added: usize, removed: usize, modified: usize) -> String {
    let mut counts = Vec::new();
    if added > 0 {
        counts.push(format!("+{added} added"));
    }
    if removed > 0 {
        counts.push(format!("-{removed} removed"));
    }
    if modified > 0 {
        counts.push(format!("~{modified} modified"));
    }
    format!("{label}: {}", counts.join(", "))
}

/// Text rendering for terminal output
pub fn format_diff_text(result: &DiffResult) -> String {
    if !result.has_changes() {
        return "No changes detected.".to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    if let Some((old, new)) = &result.profile_changed {
        parts.push(format!("Profile: {old} -> {new}"));
    }

    if !result.files_added.is_empty()
        || !result.files_removed.is_empty()
        || !result.files_modified.is_empty()
    {
        parts.push(count_line(
            "Files",
            result.files_added.len(),
            result.files_removed.len(),
            result.files_modified.len(),
        ));
    }

    if !result.files_added.is_empty() {
        parts.push(String::new());
        parts.push("Added:".to_string());
        for path in &result.files_added {
            parts.push(format!("  + {path}"));
        }
    }
    if !result.files_removed.is_empty() {
        parts.push(String::new());
        parts.push("Removed:".to_string());
        for path in &result.files_removed {
            parts.push(format!("  - {path}"));
        }
    }
    if !result.files_modified.is_empty() {
        parts.push(String::new());
        parts.push("Modified:".to_string());
        for change in &result.files_modified {
            parts.push(format!("  ~ {}", change.path));
            for detail in &change.changes {
                parts.push(format!("    - {detail}"));
            }
        }
    }

    if !result.start_here_added.is_empty() || !result.start_here_removed.is_empty() {
        parts.push(String::new());
        parts.push(count_line(
            "Start Here",
            result.start_here_added.len(),
            result.start_here_removed.len(),
            0,
        ));
        for path in &result.start_here_added {
            parts.push(format!("  + {path}"));
        }
        for path in &result.start_here_removed {
            parts.push(format!("  - {path}"));
        }
    }

    if !result.plans_added.is_empty()
        || !result.plans_removed.is_empty()
        || !result.plans_modified.is_empty()
    {
        parts.push(String::new());
        parts.push(count_line(
            "Plans",
            result.plans_added.len(),
            result.plans_removed.len(),
            result.plans_modified.len(),
        ));
        for name in &result.plans_added {
            parts.push(format!("  + {name}"));
        }
        for name in &result.plans_removed {
            parts.push(format!("  - {name}"));
        }
        for name in &result.plans_modified {
            parts.push(format!("  ~ {name}"));
        }
    }

    if !result.capabilities_added.is_empty() || !result.capabilities_removed.is_empty() {
        parts.push(String::new());
        parts.push(count_line(
            "Capabilities",
            result.capabilities_added.len(),
            result.capabilities_removed.len(),
            0,
        ));
        for cap in &result.capabilities_added {
            parts.push(format!("  + {cap}"));
        }
        for cap in &result.capabilities_removed {
            parts.push(format!("  - {cap}"));
        }
    }

    if !result.warnings_added.is_empty() || !result.warnings_removed.is_empty() {
        parts.push(String::new());
        parts.push(count_line(
            "Warnings",
            result.warnings_added.len(),
            result.warnings_removed.len(),
            0,
        ));
        for warning in &result.warnings_added {
            parts.push(format!("  + {warning}"));
        }
        for warning in &result.warnings_removed {
            parts.push(format!("  - {warning}"));
        }
    }

    if !result.modules_added.is_empty()
        || !result.modules_removed.is_empty()
        || !result.modules_modified.is_empty()
    {
        parts.push(String::new());
        parts.push(count_line(
            "Modules",
            result.modules_added.len(),
            result.modules_removed.len(),
            result.modules_modified.len(),
        ));
        for path in &result.modules_added {
            parts.push(format!("  + {path}"));
        }
        for path in &result.modules_removed {
            parts.push(format!("  - {path}"));
        }
        for path in &result.modules_modified {
            parts.push(format!("  ~ {path}"));
        }
    }

    parts.join("\n")
}

#[derive(Serialize)]
struct ProfileChange<'a> {
    old: &'a str,
    new: &'a str,
}

#[derive(Serialize)]
struct DiffView<'a> {
    has_changes: bool,
    files_added: &'a [String],
    files_removed: &'a [String],
    files_modified: &'a [FileChange],
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_changed: Option<ProfileChange<'a>>,
    start_here_added: &'a [String],
    start_here_removed: &'a [String],
    plans_added: &'a [String],
    plans_removed: &'a [String],
    plans_modified: &'a [String],
    capabilities_added: &'a [String],
    capabilities_removed: &'a [String],
    warnings_added: &'a [String],
    warnings_removed: &'a [String],
    modules_added: &'a [String],
    modules_removed: &'a [String],
    modules_modified: &'a [String],
}

/// Stable machine-readable rendering
pub fn format_diff_json(result: &DiffResult) -> String {
    let view = DiffView {
        has_changes: result.has_changes(),
        files_added: &result.files_added,
        files_removed: &result.files_removed,
        files_modified: &result.files_modified,
        profile_changed: result.profile_changed.as_ref().map(|(old, new)| {
            ProfileChange {
                old,
                new,
            }
        }),
        start_here_added: &result.start_here_added,
        start_here_removed: &result.start_here_removed,
        plans_added: &result.plans_added,
        plans_removed: &result.plans_removed,
        plans_modified: &result.plans_modified,
        capabilities_added: &result.capabilities_added,
        capabilities_removed: &result.capabilities_removed,
        warnings_added: &result.warnings_added,
        warnings_removed: &result.warnings_removed,
        modules_added: &result.modules_added,
        modules_removed: &result.modules_removed,
        modules_modified: &result.modules_modified,
    };
    serde_json::to_string_pretty(&view).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RiskFlag, Role};

    fn entry(path: &str, sha: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            sha256: sha.to_string(),
            size_bytes: 10,
            role: Role::Source,
            confidence: 0.6,
            ..Default::default()
        }
    }

    fn index_with(files: Vec<FileEntry>) -> Index {
        Index {
            profile: "python_cli".to_string(),
            files,
            ..Default::default()
        }
    }

    #[test]
    fn identical_indices_have_no_changes() {
        let index = index_with(vec![entry("a.py", "aa"), entry("b.py", "bb")]);
        let result = diff_indices(&index, &index);
        assert!(!result.has_changes());
        assert_eq!(format_diff_text(&result), "No changes detected.");
    }

    #[test]
    fn content_change_is_detected() {
        let old = index_with(vec![entry("a.py", "aa")]);
        let new = index_with(vec![entry("a.py", "cc")]);
        let result = diff_indices(&old, &new);
        assert!(result.has_changes());
        assert_eq!(result.files_modified.len(), 1);
        assert_eq!(
            result.files_modified[0].changes,
            vec!["content changed".to_string()]
        );
    }

    #[test]
    fn added_and_removed_files_are_sorted() {
        let old = index_with(vec![entry("gone.py", "aa")]);
        let new = index_with(vec![entry("z.py", "zz"), entry("a.py", "aa")]);
        let result = diff_indices(&old, &new);
        assert_eq!(result.files_added, vec!["a.py", "z.py"]);
        assert_eq!(result.files_removed, vec!["gone.py"]);
    }

    #[test]
    fn role_change_formats_old_and_new() {
        let old = index_with(vec![entry("a.py", "aa")]);
        let mut new = index_with(vec![entry("a.py", "aa")]);
        new.files[0].role = Role::Test;
        let result = diff_indices(&old, &new);
        assert_eq!(
            result.files_modified[0].changes,
            vec!["role: source -> test".to_string()]
        );
    }

    #[test]
    fn risk_flag_drift_is_reported() {
        let old = index_with(vec![entry("a.py", "aa")]);
        let mut new = index_with(vec![entry("a.py", "aa")]);
        new.files[0].risk_flags = Some(vec![RiskFlag::SecretsLike, RiskFlag::NetworkIo]);
        let result = diff_indices(&old, &new);
        assert_eq!(
            result.files_modified[0].changes,
            vec!["risk_flags added: network_io, secrets_like".to_string()]
        );
    }

    #[test]
    fn profile_change_is_reported() {
        let old = index_with(vec![]);
        let mut new = index_with(vec![]);
        new.profile = "node_ts_tool".to_string();
        let result = diff_indices(&old, &new);
        assert_eq!(
            result.profile_changed,
            Some(("python_cli".to_string(), "node_ts_tool".to_string()))
        );
        assert!(format_diff_text(&result).contains("Profile: python_cli -> node_ts_tool"));
    }

    #[test]
    fn json_rendering_includes_has_changes() {
        let old = index_with(vec![entry("a.py", "aa")]);
        let new = index_with(vec![]);
        let rendered = format_diff_json(&diff_indices(&old, &new));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["has_changes"], serde_json::Value::Bool(true));
        assert_eq!(value["files_removed"][0], "a.py");
    }
}
