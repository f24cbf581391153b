//! Index assembly: the composition root of a build
//!
//! Takes scanner output and composes role assignment, excerpts, chunk maps,
//! risk flags, module summaries, warnings, plans, and the start-here ranking
//! into one immutable [`Index`] document. The per-file pass is pure, so it
//! runs on a rayon pool; entry order follows the (already path-sorted) scan.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use rayon::prelude::*;

use crate::chunker::{chunk_text, is_chunkable, ChunkStrategy};
use crate::error::{MetaMapError, Result};
use crate::modules::build_modules;
use crate::profiles::{detect_profile, Profile};
use crate::report;
use crate::risk::{detect_risk_flags, detect_warnings};
use crate::roles::{assign_role, RoleAssignment};
use crate::scanner::{scan_directory, scan_directory_incremental, scan_zip, ScannedFile};
use crate::schema::{
    FileEntry, Index, Policy, Role, GENERATED_BY, INDEX_FORMAT, INDEX_VERSION,
};

/// Max lines retained in an excerpt
const EXCERPT_MAX_LINES: usize = 8;
/// Byte cap applied after the line cap
const EXCERPT_MAX_BYTES: usize = 1024;

/// Roles whose files get an excerpt even outside start_here
const EXCERPT_ROLES: &[Role] = &[Role::Entrypoint, Role::Doc, Role::DocArchitecture];

// ============================================================================
// Start-here ranking
// ============================================================================

/// Role priority for start_here ranking; lower reads first
const START_HERE_ROLE_PRIORITY: &[(Role, u32)] = &[
    (Role::Entrypoint, 0),
    (Role::Doc, 1),
    (Role::DocArchitecture, 2),
    (Role::Config, 3),
    (Role::PublicApi, 4),
];

/// Filenames that are always start_here candidates, with their fixed rank
const START_HERE_NAMES: &[(&str, u32)] = &[
    ("README.md", 0),
    ("README.rst", 0),
    ("ARCHITECTURE.md", 1),
    ("DESIGN.md", 2),
];

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Sort key for start_here ranking: named files 0-2, profile entrypoint
/// globs 3, role-priority matches 5+p, everything else 100; ties break by
/// lexicographic path. A total, deterministic order.
fn rank_start_here(path: &str, assignment: &RoleAssignment, profile: &Profile) -> (u32, String) {
    let name = file_name(path);

    if let Some((_, rank)) = START_HERE_NAMES.iter().find(|(n, _)| *n == name) {
        return (*rank, path.to_string());
    }

    for pattern in &profile.entrypoint_patterns {
        if Pattern::new(pattern).is_ok_and(|p| p.matches(path)) {
            return (3, path.to_string());
        }
    }

    if let Some((_, priority)) = START_HERE_ROLE_PRIORITY
        .iter()
        .find(|(role, _)| *role == assignment.role)
    {
        return (priority + 5, path.to_string());
    }

    (100, path.to_string())
}

/// Order a subset of files into the recommended reading sequence
pub fn rank_start_here_paths(
    files: &[ScannedFile],
    assignments: &[RoleAssignment],
    profile: &Profile,
) -> Vec<String> {
    let mut candidates: Vec<((u32, String), String)> = Vec::new();

    for (file, assignment) in files.iter().zip(assignments) {
        let name = file_name(&file.path);
        let is_candidate = assignment.role == Role::Entrypoint
            || assignment.role == Role::DocArchitecture
            || START_HERE_NAMES.iter().any(|(n, _)| *n == name)
            || profile.start_here_extras.contains(&file.path);
        if is_candidate {
            let rank = rank_start_here(&file.path, assignment, profile);
            candidates.push((rank, file.path.clone()));
        }
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates.into_iter().map(|(_, path)| path).collect()
}

// ============================================================================
// Excerpts
// ============================================================================

/// First [`EXCERPT_MAX_LINES`] lines of strictly-decodable UTF-8 content,
/// truncated to [`EXCERPT_MAX_BYTES`] without cutting mid-line
fn extract_excerpt(content: Option<&[u8]>) -> Option<String> {
    let data = content?;
    let text = std::str::from_utf8(data).ok()?;

    let mut excerpt = text
        .lines()
        .take(EXCERPT_MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if excerpt.is_empty() {
        return None;
    }

    if excerpt.len() > EXCERPT_MAX_BYTES {
        excerpt = excerpt.chars().take(EXCERPT_MAX_BYTES).collect();
        if let Some(idx) = excerpt.rfind('\n') {
            if idx > 0 {
                excerpt.truncate(idx);
            }
        }
    }

    (!excerpt.trim().is_empty()).then_some(excerpt)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Policy application
// ============================================================================

/// Load a policy document; a parse failure is a schema error, not an IO one
pub fn load_policy(policy_path: &Path) -> Result<Policy> {
    let raw = fs::read_to_string(policy_path)?;
    serde_json::from_str(&raw).map_err(|e| MetaMapError::InvalidPolicy {
        message: e.to_string(),
    })
}

/// Merge policy `ignore_extra` globs into the profile ignores, preserving
/// order and skipping duplicates
pub fn effective_ignore_globs(profile: &Profile, policy: Option<&Policy>) -> Vec<String> {
    let mut combined = profile.ignore_globs.clone();
    if let Some(policy) = policy {
        for pattern in &policy.ignore_extra {
            if !combined.contains(pattern) {
                combined.push(pattern.clone());
            }
        }
    }
    combined
}

// ============================================================================
// Assembly
// ============================================================================

fn make_file_entry(
    file: &ScannedFile,
    assignment: &RoleAssignment,
    start_here: &HashSet<&str>,
) -> FileEntry {
    let content = file.content.as_deref();

    let chunks = if is_chunkable(&file.path, file.size_bytes) {
        content
            .and_then(|data| std::str::from_utf8(data).ok())
            .map(|text| chunk_text(text, ChunkStrategy::Auto))
            .filter(|chunks| !chunks.is_empty())
    } else {
        None
    };

    let excerpt = if start_here.contains(file.path.as_str())
        || EXCERPT_ROLES.contains(&assignment.role)
    {
        extract_excerpt(content)
    } else {
        None
    };

    let risk_flags = detect_risk_flags(&file.path, content, file.size_bytes);

    FileEntry {
        path: file.path.clone(),
        size_bytes: file.size_bytes,
        sha256: file.sha256.clone(),
        role: assignment.role,
        confidence: round2(assignment.confidence),
        reason: Some(assignment.reason.clone()),
        chunks,
        excerpt,
        risk_flags: (!risk_flags.is_empty()).then_some(risk_flags),
    }
}

/// Assemble the index document from scanned files
///
/// Pure given its inputs: repeated builds over identical scans serialize
/// byte-identically. `capabilities` is derived from what is actually
/// populated, never configured.
pub fn build_index(files: &[ScannedFile], profile: &Profile, policy: Option<&Policy>) -> Index {
    let assignments: Vec<RoleAssignment> = files
        .par_iter()
        .map(|f| assign_role(&f.path, profile))
        .collect();

    let start_here = rank_start_here_paths(files, &assignments, profile);
    let start_here_set: HashSet<&str> = start_here.iter().map(String::as_str).collect();

    let file_entries: Vec<FileEntry> = files
        .par_iter()
        .zip(assignments.par_iter())
        .map(|(file, assignment)| make_file_entry(file, assignment, &start_here_set))
        .collect();

    let mut plans = profile.plans.clone();
    if let Some(policy) = policy {
        for (name, plan) in plans.iter_mut() {
            if let Some(budget) = policy.plan_budgets.get(name) {
                plan.max_total_bytes = Some(*budget);
            }
        }
    }

    let ignore = effective_ignore_globs(profile, policy);
    let modules = build_modules(&file_entries, 2);
    let warnings = detect_warnings(&file_entries, &ignore);

    let mut capabilities = Vec::new();
    if file_entries.iter().any(|f| f.chunks.is_some()) {
        capabilities.push("chunks".to_string());
    }
    if file_entries.iter().any(|f| f.excerpt.is_some()) {
        capabilities.push("excerpts".to_string());
    }
    if !modules.is_empty() {
        capabilities.push("modules".to_string());
    }
    if file_entries.iter().any(|f| f.risk_flags.is_some()) {
        capabilities.push("risk_flags".to_string());
    }
    if !warnings.is_empty() {
        capabilities.push("warnings".to_string());
    }

    Index {
        format: INDEX_FORMAT.to_string(),
        version: INDEX_VERSION.to_string(),
        generated_by: GENERATED_BY.to_string(),
        profile: profile.name.to_string(),
        start_here,
        ignore,
        files: file_entries,
        plans,
        modules: (!modules.is_empty()).then_some(modules),
        warnings: (!warnings.is_empty()).then_some(warnings),
        capabilities: (!capabilities.is_empty()).then_some(capabilities),
        policy_applied: policy.map(|_| true),
    }
}

// ============================================================================
// Build entry point
// ============================================================================

/// Options for a full build
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Write `META_ZIP_FRONT.md` and `META_ZIP_INDEX.json` here
    pub output_dir: Option<PathBuf>,
    /// Force a profile instead of auto-detecting
    pub profile: Option<&'static Profile>,
    /// Optional `META_ZIP_POLICY.json` path
    pub policy_path: Option<PathBuf>,
    /// Enable the incremental scanner with this hash-cache path
    /// (directory inputs only)
    pub cache_path: Option<PathBuf>,
}

/// Result of a full build
#[derive(Debug)]
pub struct BuildOutput {
    pub front: String,
    pub index: Index,
    pub project_name: String,
}

fn project_name_of(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Scan a directory or zip archive and assemble the index
///
/// Auto-detection runs a cheap preliminary scan that ignores only `.git/**`;
/// the full content-retaining scan then uses the profile ignores merged with
/// any policy extras, so policy can hide paths from the whole pipeline.
pub fn build(input: &Path, options: &BuildOptions) -> Result<BuildOutput> {
    if !input.exists() {
        return Err(MetaMapError::InputNotFound {
            path: input.display().to_string(),
        });
    }

    let policy = options
        .policy_path
        .as_deref()
        .map(load_policy)
        .transpose()?;

    let is_zip = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));

    let preliminary_ignores = vec![".git/**".to_string()];
    let (profile, files) = if input.is_dir() {
        let profile = match options.profile {
            Some(profile) => profile,
            None => detect_profile(&scan_directory(input, &preliminary_ignores, false)?),
        };
        let ignores = effective_ignore_globs(profile, policy.as_ref());
        let files = match options.cache_path.as_deref() {
            Some(cache_path) => scan_directory_incremental(input, &ignores, cache_path, true)?,
            None => scan_directory(input, &ignores, true)?,
        };
        (profile, files)
    } else if is_zip {
        if options.cache_path.is_some() {
            tracing::warn!("hash cache ignored for zip input (no usable mtimes)");
        }
        let profile = match options.profile {
            Some(profile) => profile,
            None => detect_profile(&scan_zip(input, &preliminary_ignores, false)?),
        };
        let ignores = effective_ignore_globs(profile, policy.as_ref());
        let files = scan_zip(input, &ignores, true)?;
        (profile, files)
    } else {
        return Err(MetaMapError::UnsupportedInput {
            path: input.display().to_string(),
        });
    };

    let project_name = project_name_of(input);
    let index = build_index(&files, profile, policy.as_ref());
    let front = report::build_front(&index, &project_name);

    if let Some(output_dir) = options.output_dir.as_deref() {
        fs::create_dir_all(output_dir)?;
        fs::write(output_dir.join("META_ZIP_FRONT.md"), &front)?;
        fs::write(
            output_dir.join("META_ZIP_INDEX.json"),
            index.to_json_pretty(),
        )?;
    }

    tracing::info!(
        profile = profile.name,
        files = index.files.len(),
        "assembled index for {}",
        project_name
    );

    Ok(BuildOutput {
        front,
        index,
        project_name,
    })
}
