//! File system and ZIP archive scanning
//!
//! Enumerates files from a directory tree or a zip archive, computing the
//! relative POSIX path, size, and SHA-256 of every file that survives the
//! ignore globs. Output is sorted ascending by path so the scan is
//! deterministic regardless of the underlying iteration order.
//!
//! The incremental variant keeps an on-disk hash cache keyed by relative
//! path; see [`scan_directory_incremental`] for the (deliberate) staleness
//! trade-off.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// One file discovered by a scan
///
/// `content` is retained only when requested and is owned exclusively by the
/// scan result; the index assembler consumes and drops it.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Relative POSIX-style path, no leading separator
    pub path: String,
    pub size_bytes: u64,
    /// 64 lowercase hex chars
    pub sha256: String,
    pub content: Option<Vec<u8>>,
}

/// Compute the lowercase hex SHA-256 of raw bytes
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Ignore matching
// ============================================================================

/// Pre-compiled ignore globs
///
/// A path is ignored if it matches a pattern as a whole, or if the pattern
/// ends in `/**` and any path component matches the pattern's first
/// non-`**` segment (directory shorthand, so `__pycache__/**` and
/// `**/*.egg-info/**` catch the directory at any depth).
pub struct IgnoreMatcher {
    whole: Vec<Pattern>,
    dir_shorthand: Vec<Pattern>,
}

impl IgnoreMatcher {
    pub fn new(ignore_globs: &[String]) -> Self {
        let mut whole = Vec::new();
        let mut dir_shorthand = Vec::new();
        for raw in ignore_globs {
            if let Ok(p) = Pattern::new(raw) {
                whole.push(p);
            }
            if let Some(stem) = raw.strip_suffix("/**") {
                // `**/` prefixes already mean "at any depth"; the shorthand
                // keys off the first concrete segment. A bare `**` segment
                // would match every component, so it never becomes one.
                let stem = stem.strip_prefix("**/").unwrap_or(stem);
                let leading = stem.split('/').next().unwrap_or(stem);
                if leading != "**" && !leading.is_empty() {
                    if let Ok(p) = Pattern::new(leading) {
                        dir_shorthand.push(p);
                    }
                }
            }
        }
        Self {
            whole,
            dir_shorthand,
        }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        if self.whole.iter().any(|p| p.matches(path)) {
            return true;
        }
        path.split('/')
            .any(|part| self.dir_shorthand.iter().any(|p| p.matches(part)))
    }
}

// ============================================================================
// Directory scanning
// ============================================================================

/// Scan a directory tree, returning entries sorted ascending by path
///
/// Unreadable files abort the whole scan.
pub fn scan_directory(
    root: &Path,
    ignore_globs: &[String],
    retain_content: bool,
) -> Result<Vec<ScannedFile>> {
    let matcher = IgnoreMatcher::new(ignore_globs);
    let mut rel_paths = Vec::new();
    collect_files(root, root, &mut rel_paths)?;
    rel_paths.sort();

    let mut files = Vec::with_capacity(rel_paths.len());
    for rel in rel_paths {
        if matcher.is_ignored(&rel) {
            continue;
        }
        let data = fs::read(root.join(&rel))?;
        files.push(ScannedFile {
            path: rel,
            size_bytes: data.len() as u64,
            sha256: sha256_hex(&data),
            content: retain_content.then_some(data),
        });
    }

    tracing::debug!(count = files.len(), "scanned directory {}", root.display());
    Ok(files)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(relative_posix(root, &entry.path()));
        }
    }
    Ok(())
}

fn relative_posix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

// ============================================================================
// ZIP scanning
// ============================================================================

/// Scan a zip archive, returning entries sorted ascending by path
///
/// Directory entries are skipped. Entry names are taken verbatim (including
/// hostile names like `../escape.py`); the risk detector flags them later.
pub fn scan_zip(
    zip_path: &Path,
    ignore_globs: &[String],
    retain_content: bool,
) -> Result<Vec<ScannedFile>> {
    let matcher = IgnoreMatcher::new(ignore_globs);
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut files = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let rel = entry.name().to_string();
        if matcher.is_ignored(&rel) {
            continue;
        }
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        files.push(ScannedFile {
            path: rel,
            size_bytes: data.len() as u64,
            sha256: sha256_hex(&data),
            content: retain_content.then_some(data),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(count = files.len(), "scanned archive {}", zip_path.display());
    Ok(files)
}

// ============================================================================
// Incremental cache
// ============================================================================

const CACHE_VERSION: u32 = 1;

/// One cached hash, keyed by relative path in the cache map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub sha256: String,
    pub size: u64,
    /// Modification time, whole seconds since the Unix epoch
    pub mtime: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct HashCache {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

/// Load the hash cache, treating a missing, corrupt, or version-mismatched
/// file as empty (cold start, never fatal)
pub fn load_hash_cache(cache_path: &Path) -> BTreeMap<String, CacheEntry> {
    let Ok(raw) = fs::read_to_string(cache_path) else {
        return BTreeMap::new();
    };
    match serde_json::from_str::<HashCache>(&raw) {
        Ok(cache) if cache.version == CACHE_VERSION => cache.entries,
        Ok(cache) => {
            tracing::debug!(
                found = cache.version,
                expected = CACHE_VERSION,
                "hash cache version mismatch, starting cold"
            );
            BTreeMap::new()
        }
        Err(err) => {
            tracing::debug!("unreadable hash cache, starting cold: {err}");
            BTreeMap::new()
        }
    }
}

/// Rewrite the hash cache in full (write-through, single-writer discipline)
pub fn save_hash_cache(cache_path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
    if let Some(parent) = cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let cache = HashCache {
        version: CACHE_VERSION,
        entries: entries.clone(),
    };
    let json = serde_json::to_string(&cache).unwrap_or_else(|_| "{}".to_string());
    fs::write(cache_path, json)?;
    Ok(())
}

fn mtime_secs(path: &Path) -> u64 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Scan a directory using cached hashes for unchanged files
///
/// A file is a cache hit only when both its size and its mtime match the
/// cached entry; the content is never rehashed to confirm a hit. That is a
/// performance trade-off, not a content-addressed guarantee: a forged mtime
/// can mask a change. Cache correctness only affects speed — a miss always
/// falls back to rehashing.
pub fn scan_directory_incremental(
    root: &Path,
    ignore_globs: &[String],
    cache_path: &Path,
    retain_content: bool,
) -> Result<Vec<ScannedFile>> {
    let cache = load_hash_cache(cache_path);
    let matcher = IgnoreMatcher::new(ignore_globs);

    let mut rel_paths = Vec::new();
    collect_files(root, root, &mut rel_paths)?;
    rel_paths.sort();

    let mut files = Vec::with_capacity(rel_paths.len());
    let mut new_cache = BTreeMap::new();
    let mut hits = 0usize;

    for rel in rel_paths {
        if matcher.is_ignored(&rel) {
            continue;
        }
        let full = root.join(&rel);
        let size = fs::metadata(&full)?.len();
        let mtime = mtime_secs(&full);

        let cached_hit = cache
            .get(&rel)
            .filter(|c| c.size == size && c.mtime == mtime);

        let (sha, content) = match cached_hit {
            Some(cached) => {
                hits += 1;
                let content = if retain_content {
                    Some(fs::read(&full)?)
                } else {
                    None
                };
                (cached.sha256.clone(), content)
            }
            None => {
                let data = fs::read(&full)?;
                let sha = sha256_hex(&data);
                (sha, retain_content.then_some(data))
            }
        };

        new_cache.insert(
            rel.clone(),
            CacheEntry {
                sha256: sha.clone(),
                size,
                mtime,
            },
        );
        files.push(ScannedFile {
            path: rel,
            size_bytes: size,
            sha256: sha,
            content,
        });
    }

    save_hash_cache(cache_path, &new_cache)?;
    tracing::debug!(
        count = files.len(),
        hits,
        "incremental scan of {}",
        root.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_64_lowercase_chars() {
        let hash = sha256_hex(b"hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn ignore_matches_whole_path_glob() {
        let matcher = IgnoreMatcher::new(&["*.pyc".to_string()]);
        assert!(matcher.is_ignored("src/mod.pyc"));
        assert!(!matcher.is_ignored("src/mod.py"));
    }

    #[test]
    fn ignore_matches_directory_shorthand() {
        let matcher = IgnoreMatcher::new(&["__pycache__/**".to_string()]);
        assert!(matcher.is_ignored("__pycache__/a.pyc"));
        assert!(matcher.is_ignored("src/__pycache__/a.pyc"));
        assert!(!matcher.is_ignored("src/pycache/a.py"));
    }

    #[test]
    fn leading_double_star_shorthand_keys_off_directory_name() {
        let globs = vec!["**/node_modules/**".to_string(), ".git/**".to_string()];
        let matcher = IgnoreMatcher::new(&globs);
        assert!(!matcher.is_ignored("README.md"));
        assert!(!matcher.is_ignored("packages/app/index.ts"));
        assert!(matcher.is_ignored("node_modules/left-pad/index.js"));
        assert!(matcher.is_ignored("packages/app/node_modules/x/y.js"));
        assert!(matcher.is_ignored(".git/HEAD"));
    }

    #[test]
    fn wildcard_directory_shorthand_matches_at_depth() {
        let matcher = IgnoreMatcher::new(&["**/*.egg-info/**".to_string()]);
        assert!(matcher.is_ignored("src/pkg.egg-info/PKG-INFO"));
        assert!(!matcher.is_ignored("src/pkg/info.py"));
    }

    #[test]
    fn scan_directory_sorts_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "bee").unwrap();
        fs::write(dir.path().join("a.txt"), "ay").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "sea").unwrap();

        let files = scan_directory(dir.path(), &[], false).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt", "sub/c.txt"]);
        assert_eq!(files[0].sha256, sha256_hex(b"ay"));
        assert!(files[0].content.is_none());
    }

    #[test]
    fn scan_directory_retains_content_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "payload").unwrap();
        let files = scan_directory(dir.path(), &[], true).unwrap();
        assert_eq!(files[0].content.as_deref(), Some(b"payload".as_ref()));
    }

    #[test]
    fn corrupt_cache_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        fs::write(&cache_path, "not json{{").unwrap();
        assert!(load_hash_cache(&cache_path).is_empty());
    }

    #[test]
    fn cache_version_mismatch_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        fs::write(&cache_path, r#"{"version":99,"entries":{}}"#).unwrap();
        assert!(load_hash_cache(&cache_path).is_empty());
    }

    #[test]
    fn cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("nested/cache.json");
        let mut entries = BTreeMap::new();
        entries.insert(
            "a.txt".to_string(),
            CacheEntry {
                sha256: "0".repeat(64),
                size: 3,
                mtime: 1_700_000_000,
            },
        );
        save_hash_cache(&cache_path, &entries).unwrap();
        let loaded = load_hash_cache(&cache_path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["a.txt"].size, 3);
    }
}
