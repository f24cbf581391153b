//! Validate command: structural validation of an index document

use crate::cli::ValidateArgs;
use crate::commands::CommandContext;
use crate::diff::load_index;
use crate::error::{MetaMapError, Result};
use crate::schema::{Index, INDEX_FORMAT};

fn check(index: &Index, path: &str) -> Result<()> {
    let fail = |message: String| MetaMapError::InvalidIndex {
        path: path.to_string(),
        message,
    };

    if index.format != INDEX_FORMAT {
        return Err(fail(format!(
            "unexpected format {:?}, expected {INDEX_FORMAT:?}",
            index.format
        )));
    }
    if index.version.is_empty() {
        return Err(fail("missing version".to_string()));
    }
    for entry in &index.files {
        if entry.sha256.len() != 64 || !entry.sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(fail(format!("file {:?} has a malformed sha256", entry.path)));
        }
        if !(0.0..=1.0).contains(&entry.confidence) {
            return Err(fail(format!(
                "file {:?} has confidence outside [0, 1]",
                entry.path
            )));
        }
    }
    for path in &index.start_here {
        if index.file(path).is_none() {
            return Err(fail(format!("start_here entry {path:?} is not an indexed file")));
        }
    }
    Ok(())
}

pub fn run_validate(args: &ValidateArgs, _ctx: &CommandContext) -> Result<String> {
    let path = args.input.display().to_string();
    let index = load_index(&args.input)?;
    check(&index, &path)?;

    let caps = index
        .capabilities
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| format!(", capabilities: {}", c.join(", ")))
        .unwrap_or_default();
    Ok(format!(
        "Valid META_ZIP_INDEX.json ({} files, version {}{caps})\n",
        index.files.len(),
        index.version
    ))
}
