//! zip-meta-map: metadata manifests for ZIP archives and project directories
//!
//! Scans a directory tree or zip archive and emits a deterministic,
//! machine-readable index (`META_ZIP_INDEX.json`) plus a human-facing front
//! page (`META_ZIP_FRONT.md`): per-file role classification with confidence,
//! content hashes, chunk maps for large text files, heuristic risk flags,
//! directory module summaries, reading plans, and a ranked start-here list.
//! Identical inputs always serialize byte-identically, so index documents
//! can be diffed structurally across revisions.
//!
//! Library surface:
//! - [`builder::build`] - full pipeline from input path to written artifacts
//! - [`builder::build_index`] - index assembly from scanned files
//! - [`diff::diff_indices`] - structural comparison of two indices
//! - [`scanner`], [`roles`], [`chunker`], [`risk`], [`modules`] - the
//!   individual pipeline stages

pub mod builder;
pub mod chunker;
pub mod cli;
pub mod commands;
pub mod diff;
pub mod error;
pub mod modules;
pub mod profiles;
pub mod report;
pub mod risk;
pub mod roles;
pub mod scanner;
pub mod schema;

pub use builder::{build, build_index, BuildOptions, BuildOutput};
pub use diff::{diff_indices, format_diff_json, format_diff_text, DiffResult};
pub use error::{MetaMapError, Result};
pub use schema::{FileEntry, Index, Policy, RiskFlag, Role};
