//! Diff command: structural comparison of two index documents

use crate::cli::{DiffArgs, DiffFormat};
use crate::commands::CommandContext;
use crate::diff::{diff_indices, format_diff_json, format_diff_text, load_index};
use crate::error::Result;

pub fn run_diff(args: &DiffArgs, _ctx: &CommandContext) -> Result<String> {
    let old = load_index(&args.old)?;
    let new = load_index(&args.new)?;
    let result = diff_indices(&old, &new);

    let mut out = match args.format {
        DiffFormat::Text => format_diff_text(&result),
        DiffFormat::Json => format_diff_json(&result),
    };
    out.push('\n');
    Ok(out)
}
