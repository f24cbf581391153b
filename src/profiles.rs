//! Built-in profiles: project-type detection, entrypoints, ignores, plans
//!
//! A profile is declarative per-project-type configuration. The core treats
//! it as opaque: the classifier only reads the entrypoint globs, the builder
//! only reads the ignore globs, extras, and plans.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::scanner::ScannedFile;
use crate::schema::Plan;

/// Declarative per-project-type configuration
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    /// Root-level files whose presence selects this profile
    pub detect_files: Vec<&'static str>,
    pub entrypoint_patterns: Vec<String>,
    pub start_here_extras: Vec<String>,
    pub ignore_globs: Vec<String>,
    pub plans: BTreeMap<String, Plan>,
}

/// Names of the built-in profiles, in auto-detection precedence order is NOT
/// implied here; see [`detect_profile`]
pub const PROFILE_NAMES: &[&str] = &["python_cli", "node_ts_tool", "monorepo"];

fn plan(description: &str, steps: &[&str]) -> Plan {
    Plan {
        description: description.to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        budget_bytes: None,
        max_total_bytes: None,
        stop_after: None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

static PYTHON_CLI: Lazy<Profile> = Lazy::new(|| Profile {
    name: "python_cli",
    detect_files: vec!["pyproject.toml", "setup.py", "setup.cfg"],
    entrypoint_patterns: strings(&[
        "src/*/cli.py",
        "src/*/main.py",
        "src/*/__main__.py",
        "cli.py",
        "main.py",
        "__main__.py",
    ]),
    start_here_extras: strings(&["README.md", "pyproject.toml"]),
    ignore_globs: strings(&[
        "__pycache__/**",
        "*.pyc",
        ".venv/**",
        "venv/**",
        "*.egg-info/**",
        "dist/**",
        "build/**",
        ".git/**",
        ".pytest_cache/**",
        ".mypy_cache/**",
        ".tox/**",
    ]),
    plans: BTreeMap::from([
        (
            "overview".to_string(),
            plan(
                "Quick orientation — what is this tool and how is it structured?",
                &[
                    "READ README.md",
                    "READ pyproject.toml (dependencies, entry points)",
                    "READ entrypoint file",
                    "LIST src/ directory structure",
                ],
            ),
        ),
        (
            "debug".to_string(),
            plan(
                "Find and fix a bug",
                &[
                    "READ entrypoint file",
                    "READ tests/ to understand test coverage",
                    "SCAN src/ for error handling patterns",
                    "CHECK pyproject.toml for dependency versions",
                ],
            ),
        ),
        (
            "add_feature".to_string(),
            plan(
                "Understand where to add new functionality",
                &[
                    "READ README.md for project context",
                    "READ entrypoint to understand CLI structure",
                    "LIST src/ modules to find related code",
                    "READ tests/ for test patterns to follow",
                ],
            ),
        ),
        (
            "security_review".to_string(),
            plan(
                "Identify security-sensitive code paths",
                &[
                    "SCAN for subprocess, eval, exec, os.system calls",
                    "CHECK for hardcoded secrets or credentials",
                    "REVIEW dependency list in pyproject.toml",
                    "SCAN for file I/O operations on user-supplied paths",
                ],
            ),
        ),
    ]),
});

static NODE_TS_TOOL: Lazy<Profile> = Lazy::new(|| Profile {
    name: "node_ts_tool",
    detect_files: vec!["package.json", "tsconfig.json"],
    entrypoint_patterns: strings(&[
        "src/index.ts",
        "src/main.ts",
        "src/cli.ts",
        "index.ts",
        "index.js",
    ]),
    start_here_extras: strings(&["README.md", "package.json"]),
    ignore_globs: strings(&[
        "node_modules/**",
        "dist/**",
        "build/**",
        ".git/**",
        "coverage/**",
        ".nyc_output/**",
        "*.tsbuildinfo",
        ".turbo/**",
    ]),
    plans: BTreeMap::from([
        (
            "overview".to_string(),
            plan(
                "Quick orientation",
                &[
                    "READ README.md",
                    "READ package.json (scripts, dependencies, main/bin)",
                    "READ entrypoint file",
                    "LIST src/ directory structure",
                ],
            ),
        ),
        (
            "debug".to_string(),
            plan(
                "Find and fix a bug",
                &[
                    "READ entrypoint file",
                    "READ tsconfig.json for compilation settings",
                    "SCAN src/ for error handling patterns",
                    "READ relevant test files",
                ],
            ),
        ),
        (
            "add_feature".to_string(),
            plan(
                "Understand where to add new functionality",
                &[
                    "READ README.md for project context",
                    "READ entrypoint and trace imports",
                    "LIST src/ for module layout",
                    "READ existing tests for patterns",
                ],
            ),
        ),
        (
            "security_review".to_string(),
            plan(
                "Identify security-sensitive code paths",
                &[
                    "SCAN for child_process, eval, dynamic require/import",
                    "CHECK for hardcoded secrets or tokens",
                    "REVIEW package.json dependencies",
                    "SCAN for file/network I/O with user-supplied input",
                ],
            ),
        ),
    ]),
});

static MONOREPO: Lazy<Profile> = Lazy::new(|| Profile {
    name: "monorepo",
    detect_files: vec!["pnpm-workspace.yaml", "lerna.json"],
    entrypoint_patterns: Vec::new(),
    start_here_extras: strings(&["README.md"]),
    ignore_globs: strings(&[
        "**/node_modules/**",
        "**/__pycache__/**",
        "**/dist/**",
        "**/build/**",
        ".git/**",
        "**/*.egg-info/**",
        "**/coverage/**",
        "**/.venv/**",
    ]),
    plans: BTreeMap::from([
        (
            "overview".to_string(),
            plan(
                "Understand the monorepo structure",
                &[
                    "READ root README.md",
                    "READ workspace config (pnpm-workspace.yaml / package.json / lerna.json)",
                    "LIST top-level packages/directories",
                    "READ README.md in each package (first 3)",
                ],
            ),
        ),
        (
            "debug".to_string(),
            plan(
                "Find and fix a bug across packages",
                &[
                    "IDENTIFY which package owns the bug",
                    "READ that package's entrypoint",
                    "TRACE cross-package dependencies",
                    "READ related tests",
                ],
            ),
        ),
        (
            "add_feature".to_string(),
            plan(
                "Add functionality to the right package",
                &[
                    "READ root README for architecture overview",
                    "LIST packages to identify the right target",
                    "READ target package entrypoint and structure",
                    "CHECK for shared utilities or common packages",
                ],
            ),
        ),
        (
            "security_review".to_string(),
            plan(
                "Security review across all packages",
                &[
                    "LIST all packages",
                    "SCAN each package for security-sensitive patterns",
                    "REVIEW all dependency manifests",
                    "CHECK for shared secrets or credential handling",
                ],
            ),
        ),
    ]),
});

/// Look up a built-in profile by name
pub fn by_name(name: &str) -> Option<&'static Profile> {
    match name {
        "python_cli" => Some(&PYTHON_CLI),
        "node_ts_tool" => Some(&NODE_TS_TOOL),
        "monorepo" => Some(&MONOREPO),
        _ => None,
    }
}

/// The profile used when detection finds no signal
pub fn default_profile() -> &'static Profile {
    &PYTHON_CLI
}

/// Auto-detect a profile from a preliminary file listing
///
/// Monorepo indicators are checked first (a monorepo usually also contains
/// package.json and pyproject.toml files), then node/ts, then python.
pub fn detect_profile(files: &[ScannedFile]) -> &'static Profile {
    let has = |name: &str| files.iter().any(|f| f.path == name);

    for candidate in [&*MONOREPO, &*NODE_TS_TOOL, &*PYTHON_CLI] {
        if candidate.detect_files.iter().any(|d| has(d)) {
            return by_name(candidate.name).unwrap_or_else(default_profile);
        }
    }
    default_profile()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(path: &str) -> ScannedFile {
        ScannedFile {
            path: path.to_string(),
            size_bytes: 0,
            sha256: "0".repeat(64),
            content: None,
        }
    }

    #[test]
    fn all_profiles_resolvable_by_name() {
        for name in PROFILE_NAMES {
            let profile = by_name(name).unwrap();
            assert_eq!(profile.name, *name);
            assert_eq!(profile.plans.len(), 4);
            assert!(profile.plans.contains_key("overview"));
        }
    }

    #[test]
    fn pyproject_selects_python_cli() {
        let files = vec![scanned("pyproject.toml"), scanned("src/t/main.py")];
        assert_eq!(detect_profile(&files).name, "python_cli");
    }

    #[test]
    fn package_json_selects_node() {
        let files = vec![scanned("package.json"), scanned("src/index.ts")];
        assert_eq!(detect_profile(&files).name, "node_ts_tool");
    }

    #[test]
    fn monorepo_marker_wins_over_node_and_python() {
        let files = vec![
            scanned("package.json"),
            scanned("pyproject.toml"),
            scanned("pnpm-workspace.yaml"),
        ];
        assert_eq!(detect_profile(&files).name, "monorepo");
    }

    #[test]
    fn no_signal_defaults_to_python_cli() {
        let files = vec![scanned("README.md")];
        assert_eq!(detect_profile(&files).name, "python_cli");
    }
}
