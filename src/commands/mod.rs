//! Command handlers for the zip-meta-map CLI
//!
//! Each module implements one subcommand:
//! - `build` - Scan a directory or zip and emit the metadata files
//! - `explain` - Profile detection and reading-order summary
//! - `diff` - Structural comparison of two index documents
//! - `validate` - Structural validation of an index document
//!
//! Handlers take their `Args` struct from `cli.rs` plus a shared
//! [`CommandContext`], and return the text to print on stdout.

pub mod build;
pub mod diff;
pub mod explain;
pub mod validate;

pub use build::run_build;
pub use diff::run_diff;
pub use explain::run_explain;
pub use validate::run_validate;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandContext {
    /// Show verbose output
    pub verbose: bool,
}
