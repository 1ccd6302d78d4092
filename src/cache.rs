//! Per-file import cache keyed by content hash.
//!
//! The document lives at `<root>/.cache/testsift/deptree.json` by default:
//!
//! ```json
//! {"version": "2", "entries": {"src/a.ts": {"hash": "…", "imports": ["src/b.ts"], "unresolved": ["./c"], "timestamp": 0}}}
//! ```
//!
//! A version mismatch discards the whole document. An entry is only served
//! when its stored hash equals the hash of the file's current content and
//! none of its unresolved specifiers resolves yet.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::logger::Logger;

const CACHE_FILE: &str = "deptree.json";
pub const CACHE_VERSION: &str = "2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub imports: Vec<String>,
    /// Specifiers that resolved to nothing when the entry was written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Milliseconds since the Unix epoch when the entry was written.
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: String,
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheDocument {
    fn empty() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

pub fn default_cache_dir(root: &Path) -> PathBuf {
    root.join(".cache").join("testsift")
}

/// Hex SHA-256 of `content`. Used only to detect changes.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// In-memory view of the cache document. Reads are `&self` (safe to share
/// across the parallel scan); writes go through `&mut self` after the scan.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    doc: CacheDocument,
    dirty: bool,
    /// Set after a failed write; no further writes are attempted this run.
    disabled: bool,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CacheStore {
    /// Load the cache from `dir`. Missing, corrupt, or outdated documents all
    /// yield an empty store; only a corrupt one is worth a warning.
    pub fn load(dir: &Path, logger: &dyn Logger) -> Self {
        let path = dir.join(CACHE_FILE);
        let doc = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheDocument>(&content) {
                Ok(doc) if doc.version == CACHE_VERSION => doc,
                Ok(doc) => {
                    logger.debug(&format!(
                        "cache version {} != {CACHE_VERSION}, starting fresh",
                        doc.version
                    ));
                    CacheDocument::empty()
                }
                Err(e) => {
                    logger.warn(&format!("ignoring corrupt cache '{}': {e}", path.display()));
                    CacheDocument::empty()
                }
            },
            Err(_) => CacheDocument::empty(),
        };
        Self {
            dir: dir.to_path_buf(),
            doc,
            dirty: false,
            disabled: false,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    pub fn hash(content: &str) -> String {
        content_hash(content)
    }

    /// Cached imports for `path`, only if `current_hash` matches and
    /// `resolves` rejects every specifier that was unresolved at write time.
    pub fn get(
        &self,
        path: &str,
        current_hash: &str,
        resolves: &dyn Fn(&str) -> bool,
    ) -> Option<&[String]> {
        match self.doc.entries.get(path) {
            Some(entry)
                if entry.hash == current_hash
                    && !entry.unresolved.iter().any(|s| resolves(s)) =>
            {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(&entry.imports)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&mut self, path: &str, hash: &str, imports: Vec<String>, unresolved: Vec<String>) {
        self.doc.entries.insert(
            path.to_string(),
            CacheEntry {
                hash: hash.to_string(),
                imports,
                unresolved,
                timestamp: now_millis(),
            },
        );
        self.dirty = true;
    }

    /// Drop entries for files that are no longer part of the scanned set.
    pub fn prune(&mut self, keep: &HashSet<String>) {
        let before = self.doc.entries.len();
        self.doc.entries.retain(|path, _| keep.contains(path));
        if self.doc.entries.len() != before {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.doc.entries.len(),
        }
    }

    /// Persist if dirty. A write failure is logged and disables further
    /// writes for this run; it never fails the analysis.
    pub fn save(&mut self, logger: &dyn Logger) {
        if !self.dirty || self.disabled {
            return;
        }
        match self.write() {
            Ok(()) => self.dirty = false,
            Err(e) => {
                logger.warn(&format!("{e}; continuing without cache"));
                self.disabled = true;
            }
        }
    }

    /// Reset to an empty document and persist immediately.
    pub fn clear(&mut self, logger: &dyn Logger) {
        self.doc = CacheDocument::empty();
        self.dirty = true;
        self.disabled = false;
        self.save(logger);
    }

    fn write(&self) -> Result<(), Error> {
        let path = self.path();
        fs::create_dir_all(&self.dir).map_err(|e| Error::CacheWrite(self.dir.clone(), e))?;
        let data = serde_json::to_vec(&self.doc)
            .map_err(|e| Error::CacheWrite(path.clone(), std::io::Error::other(e)))?;
        // Write-then-rename so readers never observe a torn document.
        let tmp = self.dir.join(format!("{CACHE_FILE}.tmp"));
        fs::write(&tmp, &data).map_err(|e| Error::CacheWrite(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::CacheWrite(path.clone(), e))
    }
}
