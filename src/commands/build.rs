//! Build command: scan input and generate metadata files

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;

use crate::builder::{build, BuildOptions, BuildOutput};
use crate::cli::{BuildArgs, BuildFormat, ReportFormat};
use crate::commands::CommandContext;
use crate::error::{MetaMapError, Result};
use crate::profiles;
use crate::report::{build_report, build_step_summary};
use crate::schema::Index;

pub fn run_build(args: &BuildArgs, ctx: &CommandContext) -> Result<String> {
    if let Some(policy) = args.policy.as_deref() {
        if !policy.exists() {
            return Err(MetaMapError::InputNotFound {
                path: policy.display().to_string(),
            });
        }
    }

    // With --manifest-only the builder skips its own writes and we emit
    // only the index JSON below
    let write_via_builder = !(args.manifest_only && args.output.is_some());
    let options = BuildOptions {
        output_dir: if write_via_builder {
            args.output.clone()
        } else {
            None
        },
        profile: args.profile.as_deref().and_then(profiles::by_name),
        policy_path: args.policy.clone(),
        cache_path: args.cache.clone(),
    };

    let BuildOutput {
        front,
        index,
        project_name,
    } = build(&args.input, &options)?;

    if args.manifest_only {
        if let Some(output_dir) = args.output.as_deref() {
            fs::create_dir_all(output_dir)?;
            fs::write(
                output_dir.join("META_ZIP_INDEX.json"),
                index.to_json_pretty(),
            )?;
        }
    }

    let mut out = String::new();

    if let Some(output_dir) = args.output.as_deref() {
        let wrote = if args.manifest_only {
            "META_ZIP_INDEX.json"
        } else {
            "META_ZIP_FRONT.md and META_ZIP_INDEX.json"
        };
        out.push_str(&format!("Wrote {wrote} to {}/\n", output_dir.display()));
        out.push_str(&format!("  Profile:  {}\n", index.profile));
        out.push_str(&format!("  Files:    {}\n", index.files.len()));

        let module_count = index.modules.as_deref().map_or(0, |m| m.len());
        if module_count > 0 {
            out.push_str(&format!("  Modules:  {module_count}\n"));
        }
        let chunked = index.files.iter().filter(|f| f.chunks.is_some()).count();
        if chunked > 0 {
            out.push_str(&format!("  Chunked:  {chunked} file(s)\n"));
        }
        let flagged = index
            .files
            .iter()
            .filter(|f| f.risk_flags.is_some())
            .count();
        if flagged > 0 {
            out.push_str(&format!("  Flagged:  {flagged} file(s) with risk flags\n"));
        }
        let warning_count = index.warnings.as_deref().map_or(0, |w| w.len());
        if warning_count > 0 {
            out.push_str(&format!("  Warnings: {warning_count}\n"));
        }
    } else {
        out.push_str(&render_stdout(&front, &index, args.format, args.manifest_only)?);
    }

    if ctx.verbose {
        tracing::debug!(
            project = project_name.as_str(),
            "build finished with {} file entries",
            index.files.len()
        );
    }

    if args.summary {
        let summary = build_step_summary(&index, &project_name);
        match std::env::var_os("GITHUB_STEP_SUMMARY") {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(summary.as_bytes())?;
                file.write_all(b"\n")?;
            }
            None => out.push_str(&summary),
        }
    }

    if args.report == Some(ReportFormat::Md) {
        let report = build_report(&index, &project_name);
        match args.output.as_deref() {
            Some(output_dir) => {
                fs::create_dir_all(output_dir)?;
                fs::write(output_dir.join("META_ZIP_REPORT.md"), report)?;
                out.push_str(&format!(
                    "Wrote META_ZIP_REPORT.md to {}/\n",
                    output_dir.display()
                ));
            }
            None => out.push_str(&report),
        }
    }

    Ok(out)
}

fn render_stdout(
    front: &str,
    index: &Index,
    format: BuildFormat,
    manifest_only: bool,
) -> Result<String> {
    let mut out = String::new();
    match format {
        BuildFormat::Json => {
            if manifest_only {
                out.push_str(&index.to_json_pretty());
            } else {
                let combined = serde_json::json!({
                    "front_md": front,
                    "index": index,
                });
                out.push_str(&serde_json::to_string_pretty(&combined).map_err(|e| {
                    MetaMapError::InvalidIndex {
                        path: "<stdout>".to_string(),
                        message: e.to_string(),
                    }
                })?);
                out.push('\n');
            }
        }
        BuildFormat::Ndjson => {
            for entry in &index.files {
                let line =
                    serde_json::to_string(entry).map_err(|e| MetaMapError::InvalidIndex {
                        path: "<stdout>".to_string(),
                        message: e.to_string(),
                    })?;
                out.push_str(&line);
                out.push('\n');
            }
        }
        BuildFormat::Pretty => {
            if !manifest_only {
                out.push_str("--- META_ZIP_FRONT.md ---\n");
                out.push_str(front);
                out.push('\n');
            }
            out.push_str("--- META_ZIP_INDEX.json ---\n");
            out.push_str(&index.to_json_pretty());
        }
    }
    Ok(out)
}
