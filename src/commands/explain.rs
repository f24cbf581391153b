//! Explain command: profile detection and reading-order summary

use std::fmt::Write;

use serde::Serialize;
use serde_json::Map;

use crate::builder::{build, BuildOptions};
use crate::cli::ExplainArgs;
use crate::commands::CommandContext;
use crate::error::{MetaMapError, Result};
use crate::profiles;
use crate::schema::{Index, ModuleSummary, Plan};

/// Structured payload for `explain --json`
#[derive(Serialize)]
struct ExplainData<'a> {
    profile: &'a str,
    file_count: usize,
    roles: Map<String, serde_json::Value>,
    start_here: &'a [String],
    modules: Vec<&'a ModuleSummary>,
    plans: &'a std::collections::BTreeMap<String, Plan>,
    warnings: Vec<&'a String>,
    capabilities: Vec<&'a String>,
    low_confidence_count: usize,
}

fn role_counts(index: &Index) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for file in &index.files {
        let name = file.role.to_string();
        match counts.iter_mut().find(|(role, _)| *role == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    counts
}

pub fn run_explain(args: &ExplainArgs, _ctx: &CommandContext) -> Result<String> {
    let options = BuildOptions {
        profile: args.profile.as_deref().and_then(profiles::by_name),
        ..Default::default()
    };
    let output = build(&args.input, &options)?;
    let index = &output.index;

    if args.json {
        let mut roles = Map::new();
        for (role, count) in role_counts(index) {
            roles.insert(role, serde_json::Value::from(count));
        }
        let data = ExplainData {
            profile: &index.profile,
            file_count: index.files.len(),
            roles,
            start_here: &index.start_here,
            modules: index.modules.iter().flatten().collect(),
            plans: &index.plans,
            warnings: index.warnings.iter().flatten().collect(),
            capabilities: index.capabilities.iter().flatten().collect(),
            low_confidence_count: index.files.iter().filter(|f| f.confidence < 0.5).count(),
        };
        let mut rendered =
            serde_json::to_string_pretty(&data).map_err(|e| MetaMapError::InvalidIndex {
                path: "<stdout>".to_string(),
                message: e.to_string(),
            })?;
        rendered.push('\n');
        return Ok(rendered);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Profile:  {}", index.profile);
    let _ = writeln!(out, "Files:    {}", index.files.len());
    let _ = writeln!(out);

    let mut counts = role_counts(index);
    counts.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
    let _ = writeln!(out, "Roles:");
    for (role, count) in &counts {
        let _ = writeln!(out, "  {role:20} {count}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Top files to read first:");
    for path in index.start_here.iter().take(10) {
        let (role, conf, reason) = match index.file(path) {
            Some(entry) => (
                entry.role.to_string(),
                entry.confidence,
                entry.reason.clone().unwrap_or_default(),
            ),
            None => ("?".to_string(), 0.0, String::new()),
        };
        let _ = writeln!(out, "  {path:40}  [{role}]  conf={conf:.2}  {reason}");
    }
    let _ = writeln!(out);

    if let Some(modules) = index.modules.as_deref().filter(|m| !m.is_empty()) {
        let _ = writeln!(out, "Modules ({}):", modules.len());
        for module in modules.iter().take(10) {
            let summary = module.summary.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "  {:40}  {} files  {summary}",
                module.path, module.file_count
            );
        }
        let _ = writeln!(out);
    }

    if let Some(plan) = index.plans.get("overview") {
        let _ = writeln!(out, "Overview plan:");
        let _ = writeln!(out, "  {}", plan.description);
        for (i, step) in plan.steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, step);
        }
        if let Some(bytes) = plan.max_total_bytes {
            let _ = writeln!(out, "  Budget: ~{} KB", bytes / 1024);
        }
    }
    let _ = writeln!(out);

    if let Some(warnings) = index.warnings.as_deref().filter(|w| !w.is_empty()) {
        let _ = writeln!(out, "Warnings ({}):", warnings.len());
        for warning in warnings {
            let _ = writeln!(out, "  - {warning}");
        }
        let _ = writeln!(out);
    }

    let low_conf: Vec<_> = index.files.iter().filter(|f| f.confidence < 0.5).collect();
    if !low_conf.is_empty() {
        let _ = writeln!(out, "Low confidence ({} files):", low_conf.len());
        for entry in low_conf.iter().take(5) {
            let reason = entry.reason.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "  {:40}  conf={:.2}  {reason}",
                entry.path, entry.confidence
            );
        }
        if low_conf.len() > 5 {
            let _ = writeln!(out, "  ... and {} more", low_conf.len() - 5);
        }
    }

    Ok(out)
}
