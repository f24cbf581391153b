//! Markdown renderings of an index document
//!
//! Three human-facing views: the front page written next to the index
//! (`META_ZIP_FRONT.md`), a detailed standalone report (`--report md`),
//! and a compact CI step summary (`--summary`).

use std::collections::BTreeMap;

use crate::schema::{Index, Role};

/// Role counts in first-seen order, then stably sorted by descending count
fn role_distribution(index: &Index) -> Vec<(Role, usize)> {
    let mut counts: Vec<(Role, usize)> = Vec::new();
    for file in &index.files {
        match counts.iter_mut().find(|(role, _)| *role == file.role) {
            Some((_, count)) => *count += 1,
            None => counts.push((file.role, 1)),
        }
    }
    counts.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
    counts
}

fn low_confidence(index: &Index) -> Vec<&crate::schema::FileEntry> {
    index.files.iter().filter(|f| f.confidence < 0.5).collect()
}

// ============================================================================
// Front page
// ============================================================================

fn format_plans(index: &Index) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (name, plan) in &index.plans {
        let steps = plan
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("   {}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
        let budget_note = plan
            .max_total_bytes
            .map(|bytes| format!(" (budget: ~{} KB)", bytes / 1024))
            .unwrap_or_default();
        parts.push(format!(
            "### `{name}`{budget_note}\n\n{}\n\n{steps}",
            plan.description
        ));
    }
    parts.join("\n\n")
}

fn build_modules_section(index: &Index) -> String {
    let Some(modules) = index.modules.as_deref().filter(|m| !m.is_empty()) else {
        return String::new();
    };

    let mut lines = vec!["## Modules\n".to_string()];
    for module in modules {
        let mut line = format!("- `{}/` ({} files", module.path, module.file_count);
        if !module.primary_roles.is_empty() {
            let roles = module
                .primary_roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            line.push_str(&format!(", {roles}"));
        }
        line.push(')');
        if let Some(summary) = module.summary.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" \u{2014} {summary}"));
        }
        lines.push(line);
    }
    lines.push("\n".to_string());
    lines.join("\n")
}

fn build_guardrails(index: &Index) -> String {
    let mut lines: Vec<String> = Vec::new();

    let generated: Vec<&str> = index
        .files
        .iter()
        .filter(|f| matches!(f.role, Role::Generated | Role::Vendor))
        .map(|f| f.path.as_str())
        .collect();
    if !generated.is_empty() {
        let dirs: std::collections::BTreeSet<&str> = generated
            .iter()
            .map(|p| p.rsplit_once('/').map_or(*p, |(dir, _)| dir))
            .collect();
        lines.push("## Guardrails\n".to_string());
        lines.push(
            "The following directories contain generated or vendored code \u{2014} avoid modifying:\n"
                .to_string(),
        );
        for dir in dirs.iter().take(5) {
            lines.push(format!("- `{dir}/`"));
        }
    }

    let low_conf = low_confidence(index);
    if !low_conf.is_empty() {
        if lines.is_empty() {
            lines.push("## Guardrails\n".to_string());
        }
        lines.push(format!(
            "\n{} file(s) have low classification confidence (< 0.5) \u{2014} verify roles manually.",
            low_conf.len()
        ));
    }

    if let Some(warnings) = index.warnings.as_deref().filter(|w| !w.is_empty()) {
        if lines.is_empty() {
            lines.push("## Guardrails\n".to_string());
        }
        lines.push("\n**Safety warnings:**\n".to_string());
        for warning in warnings {
            lines.push(format!("- {warning}"));
        }
    }

    if !lines.is_empty() {
        lines.push("\n".to_string());
    }
    lines.join("\n")
}

/// Render the front page placed next to the index document
pub fn build_front(index: &Index, project_name: &str) -> String {
    let start_list = if index.start_here.is_empty() {
        "- (none detected)".to_string()
    } else {
        index
            .start_here
            .iter()
            .map(|path| match index.file(path).and_then(|f| f.reason.as_deref()) {
                Some(reason) => format!("- `{path}` \u{2014} {reason}"),
                None => format!("- `{path}`"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let role_summary = role_distribution(index)
        .iter()
        .map(|(role, count)| format!("{count} {role}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "# {project_name}\n\n\
         > Auto-generated metadata by {generated_by}\n\n\
         ## Summary\n\n\
         - **Profile**: `{profile}`\n\
         - **Files indexed**: {file_count}\n\
         - **Spec version**: {version}\n\
         - **Roles**: {role_summary}\n\n\
         ## Start here\n\n\
         {start_list}\n\n\
         ## Plans\n\n\
         {plans}\n\n\
         {modules}{guardrails}---\n\n\
         *This file is for humans. Agents should prefer `META_ZIP_INDEX.json`.*\n",
        generated_by = index.generated_by,
        profile = index.profile,
        file_count = index.files.len(),
        version = index.version,
        plans = format_plans(index),
        modules = build_modules_section(index),
        guardrails = build_guardrails(index),
    )
}

// ============================================================================
// Standalone report
// ============================================================================

/// Render the detailed standalone markdown report
pub fn build_report(index: &Index, project_name: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Metadata Report: {project_name}\n\n"));
    out.push_str(&format!(
        "Generated by `{}`. Role assignments and risk flags are heuristic and advisory.\n\n",
        index.generated_by
    ));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- **Profile**: `{}`\n", index.profile));
    out.push_str(&format!("- **Files**: {}\n", index.files.len()));
    let total_bytes: u64 = index.files.iter().map(|f| f.size_bytes).sum();
    out.push_str(&format!("- **Total size**: {total_bytes} bytes\n"));
    out.push_str(&format!("- **Format**: `{}` v{}\n\n", index.format, index.version));

    out.push_str("## Start Here\n\n");
    if index.start_here.is_empty() {
        out.push_str("(none detected)\n\n");
    } else {
        for (i, path) in index.start_here.iter().enumerate() {
            let reason = index
                .file(path)
                .and_then(|f| f.reason.as_deref())
                .unwrap_or("");
            out.push_str(&format!("{}. `{path}` \u{2014} {reason}\n", i + 1));
        }
        out.push('\n');
    }

    out.push_str("## Role Distribution\n\n");
    out.push_str("| Role | Count |\n|------|-------|\n");
    for (role, count) in role_distribution(index) {
        out.push_str(&format!("| {role} | {count} |\n"));
    }
    out.push('\n');

    out.push_str("## Plans\n\n");
    for (name, plan) in &index.plans {
        out.push_str(&format!("### `{name}`\n\n{}\n\n", plan.description));
        for (i, step) in plan.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        if let Some(bytes) = plan.max_total_bytes {
            out.push_str(&format!("\nBudget: ~{} KB\n", bytes / 1024));
        }
        out.push('\n');
    }

    if let Some(modules) = index.modules.as_deref().filter(|m| !m.is_empty()) {
        out.push_str("## Modules\n\n");
        out.push_str("| Path | Files | Bytes | Primary Roles |\n");
        out.push_str("|------|-------|-------|---------------|\n");
        for module in modules {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                module.path,
                module.file_count,
                module.total_bytes,
                module
                    .primary_roles
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        out.push('\n');
    }

    out.push_str("## File Inventory\n\n");
    out.push_str("| Path | Role | Confidence | Size |\n");
    out.push_str("|------|------|------------|------|\n");
    for file in &index.files {
        out.push_str(&format!(
            "| `{}` | {} | {:.2} | {} |\n",
            file.path, file.role, file.confidence, file.size_bytes
        ));
    }
    out.push('\n');

    let flagged: Vec<&crate::schema::FileEntry> = index
        .files
        .iter()
        .filter(|f| f.risk_flags.is_some())
        .collect();
    if !flagged.is_empty() {
        out.push_str("## Risk Analysis\n\n");
        for file in &flagged {
            let flags = file
                .risk_flags
                .iter()
                .flatten()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("- `{}`: {flags}\n", file.path));
        }
        if let Some(warnings) = index.warnings.as_deref().filter(|w| !w.is_empty()) {
            out.push('\n');
            for warning in warnings {
                out.push_str(&format!("> {warning}\n"));
            }
        }
        out.push('\n');
    }

    if let Some(caps) = index.capabilities.as_deref().filter(|c| !c.is_empty()) {
        out.push_str("## Capabilities\n\n");
        for cap in caps {
            out.push_str(&format!("- `{cap}`\n"));
        }
        out.push('\n');
    }

    out
}

// ============================================================================
// CI step summary
// ============================================================================

/// Render the compact markdown block appended to `$GITHUB_STEP_SUMMARY`
pub fn build_step_summary(index: &Index, project_name: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("## zip-meta-map: {project_name}\n\n"));
    out.push_str(&format!(
        "**Profile**: `{}` \u{2022} **Files**: {}\n\n",
        index.profile,
        index.files.len()
    ));

    if !index.start_here.is_empty() {
        out.push_str("### Start Here\n\n");
        for path in index.start_here.iter().take(5) {
            out.push_str(&format!("- `{path}`\n"));
        }
        out.push('\n');
    }

    out.push_str("### Plans\n\n| Plan | Steps |\n|------|-------|\n");
    for (name, plan) in &index.plans {
        out.push_str(&format!("| `{name}` | {} |\n", plan.steps.len()));
    }
    out.push('\n');

    out.push_str("### Role Distribution\n\n| Role | Count |\n|------|-------|\n");
    for (role, count) in role_distribution(index) {
        out.push_str(&format!("| {role} | {count} |\n"));
    }
    out.push('\n');

    if let Some(caps) = index.capabilities.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("**Capabilities**: {}\n\n", caps.join(", ")));
    }

    if let Some(warnings) = index.warnings.as_deref().filter(|w| !w.is_empty()) {
        out.push_str(&format!("### Warnings ({})\n\n", warnings.len()));
        for warning in warnings {
            out.push_str(&format!("- {warning}\n"));
        }
        out.push('\n');
    }

    let mut flag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for file in &index.files {
        for flag in file.risk_flags.iter().flatten() {
            *flag_counts.entry(flag.as_str()).or_default() += 1;
        }
    }
    if !flag_counts.is_empty() {
        out.push_str("### Risk Flags\n\n| Flag | Files |\n|------|-------|\n");
        for (flag, count) in &flag_counts {
            out.push_str(&format!("| {flag} | {count} |\n"));
        }
        out.push('\n');
    }

    let chunked = index.files.iter().filter(|f| f.chunks.is_some()).count();
    if chunked > 0 {
        let total_chunks: usize = index
            .files
            .iter()
            .filter_map(|f| f.chunks.as_ref().map(Vec::len))
            .sum();
        out.push_str(&format!(
            "### Chunk Stats\n\n{chunked} file(s) chunked into {total_chunks} chunk(s)\n\n"
        ));
    }

    out
}
