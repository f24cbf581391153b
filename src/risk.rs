//! Heuristic risk detection and index-level safety warnings
//!
//! Per-file detection is conservative and lexical: path shape, extension
//! sets, a raw null-byte probe, and small regex sets over decoded text.
//! Ordering matters: the binary-masquerade probe inspects raw bytes before
//! any UTF-8 decode attempt, so a file can be flagged `binary_masquerade`
//! while the three text-pattern checks are skipped for it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{FileEntry, RiskFlag};

// Patterns that suggest shell execution
static EXEC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(subprocess|os\.system|os\.popen|shlex|exec|eval)\b",
        r"\b(child_process|spawn|execSync|execFile)\b",
        r"\b(system|popen|backtick|exec)\b",
    ])
});

// Patterns that suggest secrets or credentials
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(api[_-]?key|secret[_-]?key|password|token|credential)\s*[=:]",
        r"(?i)(aws[_-]?access|aws[_-]?secret|private[_-]?key)",
        r"(?:^|\s)(sk-[a-zA-Z0-9]{20,}|ghp_[a-zA-Z0-9]{36,}|AKIA[A-Z0-9]{16})",
    ])
});

// Patterns that suggest network I/O
static NETWORK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(requests\.|urllib|fetch\(|axios|http\.get|https\.get)\b",
        r"\b(socket|websocket|net\.connect)\b",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

/// Known binary extensions, flagged independent of content
const BINARY_EXTS: &[&str] = &[
    ".exe", ".dll", ".so", ".dylib", ".bin", ".dat", ".class", ".pyc", ".pyo", ".wasm",
];

/// Extensions that should always hold text; binary content here is suspicious
const TEXT_EXTS_FOR_BINARY_CHECK: &[&str] = &[
    ".py", ".ts", ".js", ".md", ".json", ".yaml", ".yml", ".toml", ".txt", ".rst", ".html",
    ".css", ".xml", ".sh",
];

/// Directory names whose exclusion from a scan deserves a warning
const SECURITY_SENSITIVE_DIRS: &[&str] = &[
    "auth",
    "config",
    "security",
    "secrets",
    "credentials",
    ".ssh",
    ".gnupg",
];

/// Null byte anywhere in the first 8 KiB marks the content as binary
fn looks_binary(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(8192)];
    sample.contains(&0)
}

/// Lowercased extension of the final path component, including a leading-dot
/// name like `.env`
fn file_ext(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Detect heuristic risk signals for a single file
///
/// Each rule is evaluated independently; a file may carry several flags. A
/// UTF-8 decode failure silently skips only the three text-pattern checks.
pub fn detect_risk_flags(
    path: &str,
    content: Option<&[u8]>,
    _size_bytes: u64,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    let ext = file_ext(path);

    // Any literal ".." path segment
    if path.split('/').any(|part| part == "..") {
        flags.push(RiskFlag::PathTraversal);
    }

    // Raw-byte probe, runs before any decode attempt
    if TEXT_EXTS_FOR_BINARY_CHECK.contains(&ext.as_str()) {
        if let Some(data) = content {
            if looks_binary(data) {
                flags.push(RiskFlag::BinaryMasquerade);
            }
        }
    }

    if BINARY_EXTS.contains(&ext.as_str()) {
        flags.push(RiskFlag::BinaryExecutable);
    }

    // Content checks, only for strictly-decodable text outside binary extensions
    if let Some(data) = content {
        if !BINARY_EXTS.contains(&ext.as_str()) {
            let Ok(text) = std::str::from_utf8(data) else {
                return flags;
            };
            if EXEC_PATTERNS.iter().any(|p| p.is_match(text)) {
                flags.push(RiskFlag::ExecShell);
            }
            if SECRET_PATTERNS.iter().any(|p| p.is_match(text)) {
                flags.push(RiskFlag::SecretsLike);
            }
            if NETWORK_PATTERNS.iter().any(|p| p.is_match(text)) {
                flags.push(RiskFlag::NetworkIo);
            }
        }
    }

    flags
}

/// Generate index-level advisory warnings, at most one line per category
pub fn detect_warnings(file_entries: &[FileEntry], ignore_globs: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();

    let traversal: Vec<&str> = file_entries
        .iter()
        .filter(|f| f.path.split('/').any(|part| part == ".."))
        .map(|f| f.path.as_str())
        .collect();
    if !traversal.is_empty() {
        warnings.push(format!(
            "Path traversal detected in {} file(s): {}",
            traversal.len(),
            traversal
                .iter()
                .take(3)
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let binary_count = file_entries
        .iter()
        .filter(|f| f.has_flag(RiskFlag::BinaryExecutable))
        .count();
    if binary_count > 0 {
        warnings.push(format!(
            "{binary_count} binary executable(s) found in archive"
        ));
    }

    let masquerade_count = file_entries
        .iter()
        .filter(|f| f.has_flag(RiskFlag::BinaryMasquerade))
        .count();
    if masquerade_count > 0 {
        warnings.push(format!(
            "{masquerade_count} file(s) have text extensions but contain binary data"
        ));
    }

    let secrets_count = file_entries
        .iter()
        .filter(|f| f.has_flag(RiskFlag::SecretsLike))
        .count();
    if secrets_count > 0 {
        warnings.push(format!(
            "{secrets_count} file(s) contain patterns that look like secrets or credentials"
        ));
    }

    // An ignore rule can hide security-relevant content from the scan itself
    for glob_pattern in ignore_globs {
        let first_segment = glob_pattern.split('/').next().unwrap_or(glob_pattern);
        let dir_part = first_segment.trim_matches(|c| c == '*' || c == '?');
        if SECURITY_SENSITIVE_DIRS.contains(&dir_part.to_lowercase().as_str()) {
            warnings.push(format!(
                "Ignore pattern '{glob_pattern}' hides a security-critical directory"
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Role;

    fn entry(path: &str, flags: &[RiskFlag]) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            size_bytes: 1,
            sha256: "0".repeat(64),
            role: Role::Unknown,
            confidence: 0.3,
            risk_flags: (!flags.is_empty()).then(|| flags.to_vec()),
            ..Default::default()
        }
    }

    #[test]
    fn traversal_segment_is_flagged() {
        let flags = detect_risk_flags("../escape.py", None, 0);
        assert!(flags.contains(&RiskFlag::PathTraversal));
        let flags = detect_risk_flags("safe/../../etc/passwd", None, 0);
        assert!(flags.contains(&RiskFlag::PathTraversal));
    }

    #[test]
    fn dotdot_inside_a_name_is_not_traversal() {
        let flags = detect_risk_flags("notes..md/file.txt", None, 0);
        assert!(!flags.contains(&RiskFlag::PathTraversal));
    }

    #[test]
    fn binary_extension_flagged_without_content() {
        let flags = detect_risk_flags("app.exe", None, 100);
        assert_eq!(flags, vec![RiskFlag::BinaryExecutable]);
    }

    #[test]
    fn null_bytes_in_text_extension_is_masquerade() {
        let flags = detect_risk_flags("evil.py", Some(b"print('ok')\x00\x00BLOB"), 20);
        assert!(flags.contains(&RiskFlag::BinaryMasquerade));
    }

    #[test]
    fn masquerade_fires_even_when_decode_checks_are_skipped() {
        // Invalid UTF-8 plus a null byte: the raw probe flags it while the
        // regex checks are silently skipped.
        let data: Vec<u8> = vec![0xff, 0xfe, 0x00, b'e', b'x', b'e', b'c'];
        let flags = detect_risk_flags("weird.py", Some(&data), data.len() as u64);
        assert_eq!(flags, vec![RiskFlag::BinaryMasquerade]);
    }

    #[test]
    fn exec_secrets_and_network_patterns() {
        let content = br#"
import subprocess
import requests
API_KEY = "sk-test1234567890abcdef1234567890"
subprocess.run(["ls"])
requests.get("https://example.com")
"#;
        let flags = detect_risk_flags("risky.py", Some(content), content.len() as u64);
        assert!(flags.contains(&RiskFlag::ExecShell));
        assert!(flags.contains(&RiskFlag::SecretsLike));
        assert!(flags.contains(&RiskFlag::NetworkIo));
    }

    #[test]
    fn clean_text_has_no_flags() {
        let flags = detect_risk_flags("hello.py", Some(b"print('hello')"), 14);
        assert!(flags.is_empty());
    }

    #[test]
    fn warnings_traversal_lists_up_to_three_examples() {
        let entries: Vec<FileEntry> = (0..5)
            .map(|i| entry(&format!("../e{i}.py"), &[RiskFlag::PathTraversal]))
            .collect();
        let warnings = detect_warnings(&entries, &[]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("5 file(s)"));
        assert!(warnings[0].contains("../e0.py"));
        assert!(!warnings[0].contains("../e3.py"));
    }

    #[test]
    fn warnings_count_binary_and_secrets() {
        let entries = vec![
            entry("a.exe", &[RiskFlag::BinaryExecutable]),
            entry("b.dll", &[RiskFlag::BinaryExecutable]),
            entry("conf.py", &[RiskFlag::SecretsLike]),
        ];
        let warnings = detect_warnings(&entries, &[]);
        assert!(warnings.iter().any(|w| w.contains("2 binary executable(s)")));
        assert!(warnings
            .iter()
            .any(|w| w.contains("secrets or credentials")));
    }

    #[test]
    fn sensitive_ignore_globs_are_warned_about() {
        let globs = vec![
            "secrets/**".to_string(),
            ".ssh/**".to_string(),
            "node_modules/**".to_string(),
        ];
        let warnings = detect_warnings(&[], &globs);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'secrets/**'"));
        assert!(warnings[1].contains("'.ssh/**'"));
    }

    #[test]
    fn no_entries_no_warnings() {
        assert!(detect_warnings(&[], &["dist/**".to_string()]).is_empty());
    }
}
