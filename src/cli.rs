//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::profiles::PROFILE_NAMES;

/// Metadata manifest generator for ZIP archives and project directories
#[derive(Parser, Debug)]
#[command(name = "zip-meta-map")]
#[command(about = "Generate machine-readable metadata manifests for ZIP archives and project directories")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan input and generate metadata files
    #[command(visible_alias = "b")]
    Build(BuildArgs),

    /// Show detected profile and top files to read
    #[command(visible_alias = "e")]
    Explain(ExplainArgs),

    /// Compare two META_ZIP_INDEX.json files
    #[command(visible_alias = "d")]
    Diff(DiffArgs),

    /// Validate a META_ZIP_INDEX.json file
    Validate(ValidateArgs),
}

// ============================================
// Build Subcommand
// ============================================

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to a directory or .zip file
    pub input: PathBuf,

    /// Output directory for generated files (default: print to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Force a specific profile (default: auto-detect)
    #[arg(short, long, value_parser = clap::builder::PossibleValuesParser::new(PROFILE_NAMES))]
    pub profile: Option<String>,

    /// Path to a META_ZIP_POLICY.json file
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Output format when printing to stdout
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: BuildFormat,

    /// Emit only META_ZIP_INDEX.json (no FRONT.md), useful for pipelines
    #[arg(long)]
    pub manifest_only: bool,

    /// Write a step summary to $GITHUB_STEP_SUMMARY (or stdout if not in CI)
    #[arg(long)]
    pub summary: bool,

    /// Generate a detailed standalone markdown report
    #[arg(long, value_enum)]
    pub report: Option<ReportFormat>,

    /// Hash-cache file for incremental directory scans
    #[arg(long)]
    pub cache: Option<PathBuf>,
}

/// Stdout format for the build command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildFormat {
    /// Front page plus indented index JSON
    #[default]
    Pretty,
    /// Single JSON document
    Json,
    /// One JSON line per file entry
    Ndjson,
}

/// Report output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown
    Md,
}

// ============================================
// Explain Subcommand
// ============================================

/// Arguments for the explain command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Path to a directory or .zip file
    pub input: PathBuf,

    /// Force a specific profile (default: auto-detect)
    #[arg(short, long, value_parser = clap::builder::PossibleValuesParser::new(PROFILE_NAMES))]
    pub profile: Option<String>,

    /// Output explain results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================
// Diff Subcommand
// ============================================

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Path to the old META_ZIP_INDEX.json
    pub old: PathBuf,

    /// Path to the new META_ZIP_INDEX.json
    pub new: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: DiffFormat,
}

/// Output format for the diff command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffFormat {
    /// Human-readable section report
    #[default]
    Text,
    /// Stable machine-readable JSON
    Json,
}

// ============================================
// Validate Subcommand
// ============================================

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a META_ZIP_INDEX.json file
    pub input: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_defaults() {
        let cli = Cli::parse_from(["zip-meta-map", "build", "some/dir"]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.format, BuildFormat::Pretty);
        assert!(args.output.is_none());
        assert!(!args.manifest_only);
    }

    #[test]
    fn profile_values_are_restricted() {
        let result = Cli::try_parse_from(["zip-meta-map", "build", "x", "-p", "nope"]);
        assert!(result.is_err());
        let ok = Cli::try_parse_from(["zip-meta-map", "build", "x", "-p", "python_cli"]);
        assert!(ok.is_ok());
    }

    #[test]
    fn diff_takes_two_paths() {
        let cli = Cli::parse_from(["zip-meta-map", "diff", "a.json", "b.json", "--format", "json"]);
        let Commands::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.format, DiffFormat::Json);
    }
}
