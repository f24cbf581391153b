//! Directory-level module summaries
//!
//! Groups classified file entries by parent directory and produces aggregate
//! statistics plus a short heuristic prose summary per directory.

use std::collections::BTreeMap;

use crate::schema::{FileEntry, ModuleSummary, Role};

/// Roles that mark a file as "key" within a module
const KEY_ROLES: &[Role] = &[
    Role::Entrypoint,
    Role::PublicApi,
    Role::Config,
    Role::Doc,
    Role::DocArchitecture,
];

/// Parent directory of a path, `"."` for root-level files
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// Role counts in descending order; ties keep [`Role::ALL`] declaration order
fn ranked_roles(entries: &[&FileEntry]) -> Vec<(Role, usize)> {
    let mut ranked: Vec<(Role, usize)> = Role::ALL
        .iter()
        .map(|&role| (role, entries.iter().filter(|f| f.role == role).count()))
        .filter(|(_, count)| *count > 0)
        .collect();
    ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranked
}

/// Build module summaries from classified file entries
///
/// Directories with fewer than `min_files` files are dropped. Output is
/// sorted by directory path.
pub fn build_modules(file_entries: &[FileEntry], min_files: usize) -> Vec<ModuleSummary> {
    let mut by_dir: BTreeMap<&str, Vec<&FileEntry>> = BTreeMap::new();
    for entry in file_entries {
        by_dir.entry(parent_dir(&entry.path)).or_default().push(entry);
    }

    let mut modules = Vec::new();
    for (dir_path, entries) in by_dir {
        if entries.len() < min_files {
            continue;
        }

        let ranked = ranked_roles(&entries);
        let total_bytes: u64 = entries.iter().map(|f| f.size_bytes).sum();

        let primary_roles: Vec<Role> = ranked
            .iter()
            .map(|(role, _)| *role)
            .filter(|role| *role != Role::Unknown)
            .take(3)
            .collect();

        let key_files: Vec<String> = entries
            .iter()
            .filter(|f| KEY_ROLES.contains(&f.role))
            .take(5)
            .map(|f| f.path.clone())
            .collect();

        let summary = generate_summary(&ranked, &entries);

        modules.push(ModuleSummary {
            path: dir_path.to_string(),
            file_count: entries.len(),
            total_bytes,
            primary_roles,
            key_files: (!key_files.is_empty()).then_some(key_files),
            summary,
        });
    }

    modules
}

/// A short sentence from role labels, entrypoint names, and file count;
/// `None` when there is no signal at all
fn generate_summary(ranked: &[(Role, usize)], entries: &[&FileEntry]) -> Option<String> {
    let mut parts = Vec::new();

    let labels: Vec<&str> = ranked
        .iter()
        .map(|(role, _)| *role)
        .filter(|role| *role != Role::Unknown)
        .take(3)
        .map(Role::label)
        .collect();
    if !labels.is_empty() {
        parts.push(format!("Contains {}", labels.join(", ")));
    }

    let entry_names: Vec<&str> = entries
        .iter()
        .filter(|f| f.role == Role::Entrypoint)
        .take(2)
        .map(|f| f.path.rsplit('/').next().unwrap_or(&f.path))
        .collect();
    if !entry_names.is_empty() {
        parts.push(format!("entry: {}", entry_names.join(", ")));
    }

    if entries.len() >= 10 {
        parts.push(format!("{} files", entries.len()));
    }

    (!parts.is_empty()).then(|| parts.join("; "))
}
