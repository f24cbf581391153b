//! Deterministic chunking for large text files
//!
//! Produces an ordered, non-overlapping partition of a file's line range.
//! Chunk IDs are content-addressed (`chunk_<start_line>_<hash12>`), so
//! identical chunk content at the same starting line reproduces the same ID
//! even when surrounding chunks change. `sum(byte_len)` over the chunk list
//! always equals the UTF-8 length of the whole input.

use crate::scanner::sha256_hex;
use crate::schema::ChunkInfo;

/// Files at or above this size get chunked
pub const CHUNK_THRESHOLD_BYTES: u64 = 32 * 1024;

/// Target lines per fixed-window chunk
pub const CHUNK_TARGET_LINES: usize = 100;

/// Extensions that are safe to chunk as text
const TEXT_EXTS: &[&str] = &[
    ".py", ".ts", ".js", ".tsx", ".jsx", ".rs", ".go", ".java", ".cs", ".cpp", ".c", ".h", ".hpp",
    ".rb", ".php", ".swift", ".kt", ".scala", ".md", ".rst", ".txt", ".toml", ".yaml", ".yml",
    ".json", ".xml", ".sh", ".bash", ".zsh", ".ps1", ".cfg", ".ini", ".sql", ".html", ".css",
    ".scss", ".less", ".lua", ".ex", ".exs", ".zig", ".nim", ".graphql", ".gql", ".proto",
];

/// Markdown heading markers, `#` through `######` plus a space
const MD_HEADING_PREFIXES: &[&str] = &["# ", "## ", "### ", "#### ", "##### ", "###### "];

/// Chunking strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Heading-based when the content has at least 2 Markdown headings,
    /// fixed line windows otherwise
    #[default]
    Auto,
    Headings,
    Lines,
}

/// True iff the file is large enough and has a chunkable text extension
pub fn is_chunkable(path: &str, size_bytes: u64) -> bool {
    if size_bytes < CHUNK_THRESHOLD_BYTES {
        return false;
    }
    let ext = match path.rfind('.') {
        Some(idx) => path[idx..].to_lowercase(),
        None => return false,
    };
    TEXT_EXTS.contains(&ext.as_str())
}

/// Split text into lines, keeping the line terminators
///
/// Breaks on `\n`, `\r\n`, and lone `\r` so legacy line endings still count
/// as lines.
fn split_keepends(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        let end = match bytes[idx] {
            b'\n' => idx,
            b'\r' => {
                if bytes.get(idx + 1) == Some(&b'\n') {
                    idx + 1
                } else {
                    idx
                }
            }
            _ => {
                idx += 1;
                continue;
            }
        };
        lines.push(&content[start..=end]);
        start = end + 1;
        idx = end + 1;
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

fn is_heading(line: &str) -> bool {
    let stripped = line.trim_start();
    MD_HEADING_PREFIXES.iter().any(|p| stripped.starts_with(p))
}

/// `chunk_<start_line>_<first 12 hex chars of SHA-256(trimmed chunk text)>`
fn stable_chunk_id(text: &str, start_line: usize) -> String {
    let hash = sha256_hex(text.trim().as_bytes());
    format!("chunk_{start_line}_{}", &hash[..12])
}

/// Chunk text content into an ordered, gap-free partition
///
/// Returns an empty list for empty content. The caller decides whether the
/// content decodes as UTF-8 at all; non-decodable files simply get no chunks.
pub fn chunk_text(content: &str, strategy: ChunkStrategy) -> Vec<ChunkInfo> {
    let lines = split_keepends(content);
    if lines.is_empty() {
        return Vec::new();
    }

    let strategy = match strategy {
        ChunkStrategy::Auto => {
            let heading_count = lines.iter().filter(|l| is_heading(l)).count();
            if heading_count >= 2 {
                ChunkStrategy::Headings
            } else {
                ChunkStrategy::Lines
            }
        }
        other => other,
    };

    match strategy {
        ChunkStrategy::Headings => chunk_by_headings(&lines),
        _ => chunk_by_lines(&lines),
    }
}

/// Fixed windows of [`CHUNK_TARGET_LINES`]; the final window may be shorter
fn chunk_by_lines(lines: &[&str]) -> Vec<ChunkInfo> {
    let mut chunks = Vec::new();
    let total = lines.len();
    let mut start = 0;

    while start < total {
        let end = (start + CHUNK_TARGET_LINES).min(total);
        let text: String = lines[start..end].concat();
        chunks.push(ChunkInfo {
            id: stable_chunk_id(&text, start + 1),
            start_line: start + 1,
            end_line: end,
            byte_len: text.len(),
            heading: None,
        });
        start = end;
    }

    chunks
}

/// New chunk at every heading line except one at the very first line; content
/// before the first heading forms a chunk with no heading
fn chunk_by_headings(lines: &[&str]) -> Vec<ChunkInfo> {
    let mut chunks = Vec::new();
    let mut current_start = 0;
    let mut current_heading: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        if i > 0 && is_heading(line) {
            let text: String = lines[current_start..i].concat();
            if !text.is_empty() {
                chunks.push(ChunkInfo {
                    id: stable_chunk_id(&text, current_start + 1),
                    start_line: current_start + 1,
                    end_line: i,
                    byte_len: text.len(),
                    heading: current_heading.clone(),
                });
            }
            current_start = i;
            current_heading = Some(line.trim_start().trim_end().to_string());
        }
    }

    if current_start < lines.len() {
        let text: String = lines[current_start..].concat();
        chunks.push(ChunkInfo {
            id: stable_chunk_id(&text, current_start + 1),
            start_line: current_start + 1,
            end_line: lines.len(),
            byte_len: text.len(),
            heading: current_heading,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(content: &str, chunks: &[ChunkInfo]) {
        let total_lines = split_keepends(content).len();
        assert_eq!(chunks.first().unwrap().start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, total_lines);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1, "gap or overlap");
        }
        let byte_sum: usize = chunks.iter().map(|c| c.byte_len).sum();
        assert_eq!(byte_sum, content.len());
    }

    #[test]
    fn not_chunkable_below_threshold() {
        assert!(!is_chunkable("big.py", CHUNK_THRESHOLD_BYTES - 1));
        assert!(is_chunkable("big.py", CHUNK_THRESHOLD_BYTES));
    }

    #[test]
    fn not_chunkable_for_binary_extension() {
        assert!(!is_chunkable("app.exe", 1 << 20));
        assert!(!is_chunkable("noext", 1 << 20));
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_text("", ChunkStrategy::Auto).is_empty());
    }

    #[test]
    fn line_windows_partition_plain_text() {
        let content: String = (0..250).map(|i| format!("line {i}\n")).collect();
        let chunks = chunk_text(&content, ChunkStrategy::Auto);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 100);
        assert_eq!(chunks[2].end_line, 250);
        assert_partition(&content, &chunks);
        assert!(chunks.iter().all(|c| c.heading.is_none()));
    }

    #[test]
    fn auto_picks_headings_for_markdown() {
        let content = "intro\n# One\nbody one\n## Two\nbody two\n";
        let chunks = chunk_text(content, ChunkStrategy::Auto);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].heading, None);
        assert_eq!(chunks[1].heading.as_deref(), Some("# One"));
        assert_eq!(chunks[2].heading.as_deref(), Some("## Two"));
        assert_partition(content, &chunks);
    }

    #[test]
    fn heading_on_first_line_does_not_split() {
        let content = "# Title\nbody\n# Next\nmore\n";
        let chunks = chunk_text(content, ChunkStrategy::Headings);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].heading, None);
        assert_eq!(chunks[1].heading.as_deref(), Some("# Next"));
    }

    #[test]
    fn single_heading_falls_back_to_line_windows() {
        let mut content = String::from("# Only one heading\n");
        for i in 0..150 {
            content.push_str(&format!("text {i}\n"));
        }
        let chunks = chunk_text(&content, ChunkStrategy::Auto);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.heading.is_none()));
    }

    #[test]
    fn chunk_ids_are_stable_across_calls() {
        let content: String = (0..3000).map(|i| format!("line {i}\n")).collect();
        let a = chunk_text(&content, ChunkStrategy::Auto);
        let b = chunk_text(&content, ChunkStrategy::Auto);
        assert!(a.len() >= 2);
        assert_eq!(a, b);
        for chunk in &a {
            assert!(chunk.id.starts_with(&format!("chunk_{}_", chunk.start_line)));
        }
    }

    #[test]
    fn chunk_id_independent_of_surrounding_content() {
        let block: String = (0..100).map(|i| format!("shared {i}\n")).collect();
        let doc_a = format!("{block}{}", "tail a\n");
        let doc_b = format!("{block}{}", "different tail b\n");
        let chunks_a = chunk_text(&doc_a, ChunkStrategy::Lines);
        let chunks_b = chunk_text(&doc_b, ChunkStrategy::Lines);
        // First window is identical content at the same start line
        assert_eq!(chunks_a[0].id, chunks_b[0].id);
        assert_ne!(chunks_a[1].id, chunks_b[1].id);
    }

    #[test]
    fn carriage_return_terminators_count_as_lines() {
        let cr_only: String = (0..250).map(|i| format!("line {i}\r")).collect();
        let chunks = chunk_text(&cr_only, ChunkStrategy::Lines);
        assert_eq!(chunks.len(), 3);
        assert_partition(&cr_only, &chunks);

        let crlf = "a\r\nb\r\nc\r\n";
        let chunks = chunk_text(crlf, ChunkStrategy::Lines);
        assert_eq!(chunks[0].end_line, 3);
        assert_partition(crlf, &chunks);
    }

    #[test]
    fn byte_lengths_sum_to_input_length_without_trailing_newline() {
        let content = "a\nb\nc"; // no trailing newline
        let chunks = chunk_text(content, ChunkStrategy::Lines);
        assert_partition(content, &chunks);
    }
}
