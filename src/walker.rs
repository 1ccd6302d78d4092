use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::cache::{CacheStore, default_cache_dir};
use crate::glob::GlobList;
use crate::graph::DependencyGraph;
use crate::lang::SourceExtractor;
use crate::lang::typescript::TypeScriptSupport;
use crate::lang::typescript::resolver::ImportResolver;
use crate::logger::Logger;
use crate::monorepo::MonorepoInfo;

fn is_parseable(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Project-relative, forward-slash form of `path`. `None` outside `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.to_string_lossy().replace('\\', "/");
    (!rel.is_empty()).then_some(rel)
}

/// Discover source files using the ignore crate (respects .gitignore).
/// Directories named in `skip_dirs` are never entered; files matching any
/// of `ignore` (project-relative globs) are dropped. Sorted by path.
pub fn discover_source_files(
    root: &Path,
    extractor: &dyn SourceExtractor,
    ignore: &GlobList,
) -> Vec<PathBuf> {
    let extensions = extractor.extensions();
    let skip: Vec<String> = extractor.skip_dirs().iter().map(ToString::to_string).collect();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| skip.iter().any(|s| s == n));
            }
            true
        })
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| is_parseable(path, extensions))
        .filter(|path| {
            ignore.is_empty() || !relative_path(root, path).is_some_and(|rel| ignore.is_match(&rel))
        })
        .collect();
    files.sort();
    files
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions<'a> {
    /// Skip the cache entirely: no reads, no writes.
    pub no_cache: bool,
    /// Workspace layout used to resolve package-name imports.
    pub monorepo: Option<&'a MonorepoInfo>,
    /// Project-relative globs excluded from discovery.
    pub ignore_patterns: &'a [String],
    /// Defaults to `<root>/.cache/testsift`.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub files_scanned: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub read_errors: usize,
}

/// Result of building a dependency graph.
#[derive(Debug)]
pub struct BuildResult {
    pub graph: DependencyGraph,
    /// Every scanned file, project-relative, sorted.
    pub files: Vec<String>,
    pub stats: BuildStats,
}

struct Staged {
    hash: String,
    imports: Vec<String>,
    unresolved: Vec<String>,
}

/// Imports of one file, split by whether they resolved.
struct Resolved {
    imports: Vec<String>,
    unresolved: Vec<String>,
}

/// Outcome of scanning one file.
struct FileScan {
    rel: String,
    imports: Vec<String>,
    exports: Vec<String>,
    /// Cache entry to store once the parallel scan is over.
    staged: Option<Staged>,
    cache_hit: bool,
    read_error: bool,
}

struct Scanner<'a> {
    root: &'a Path,
    extractor: &'a dyn SourceExtractor,
    resolver: ImportResolver<'a>,
    cache: Option<&'a CacheStore>,
    logger: &'a dyn Logger,
}

impl Scanner<'_> {
    fn scan(&self, path: &Path) -> FileScan {
        let rel = relative_path(self.root, path).unwrap_or_default();
        let mut scan = FileScan {
            rel,
            imports: Vec::new(),
            exports: Vec::new(),
            staged: None,
            cache_hit: false,
            read_error: false,
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                self.logger
                    .debug(&format!("skipping unreadable {}: {e}", path.display()));
                scan.read_error = true;
                return scan;
            }
        };
        scan.exports = self.extractor.extract_exports(&content);

        let Some(cache) = self.cache else {
            scan.imports = self.resolve_imports(path, &content).imports;
            return scan;
        };
        let hash = CacheStore::hash(&content);
        let source_dir = path.parent().unwrap_or(self.root);
        // A target created since the entry was written must produce a new edge.
        let resolves = |specifier: &str| self.resolver.resolve(source_dir, specifier).is_some();
        if let Some(cached) = cache.get(&scan.rel, &hash, &resolves) {
            // A cached target may have been deleted since the entry was written.
            scan.imports = cached
                .iter()
                .filter(|p| self.root.join(p).is_file())
                .cloned()
                .collect();
            scan.cache_hit = true;
        } else {
            let resolved = self.resolve_imports(path, &content);
            scan.imports = resolved.imports.clone();
            scan.staged = Some(Staged {
                hash,
                imports: resolved.imports,
                unresolved: resolved.unresolved,
            });
        }
        scan
    }

    fn resolve_imports(&self, path: &Path, content: &str) -> Resolved {
        let source_dir = path.parent().unwrap_or(self.root);
        let mut resolved = Resolved {
            imports: Vec::new(),
            unresolved: Vec::new(),
        };
        for specifier in self.extractor.extract_imports(content) {
            let Some(target) = self.resolver.resolve(source_dir, &specifier) else {
                if !resolved.unresolved.contains(&specifier) {
                    resolved.unresolved.push(specifier);
                }
                continue;
            };
            if let Some(rel) = relative_path(self.root, &target)
                && !resolved.imports.contains(&rel)
            {
                resolved.imports.push(rel);
            }
        }
        resolved
    }
}

/// Build the dependency graph for every TS/JS file under `root`.
pub fn build_dependency_graph(
    root: &Path,
    options: &BuildOptions<'_>,
    logger: &dyn Logger,
) -> BuildResult {
    build_dependency_graph_with(root, &TypeScriptSupport::new(), options, logger)
}

/// [`build_dependency_graph`] with an explicit extractor.
///
/// Files are scanned in parallel against a read-only cache; new cache
/// entries are merged after the scan and the cache is written once.
pub fn build_dependency_graph_with(
    root: &Path,
    extractor: &dyn SourceExtractor,
    options: &BuildOptions<'_>,
    logger: &dyn Logger,
) -> BuildResult {
    let ignore = GlobList::new(options.ignore_patterns);
    let source_files = discover_source_files(root, extractor, &ignore);
    logger.debug(&format!("discovered {} source files", source_files.len()));

    let mut cache = (!options.no_cache).then(|| {
        let dir = options
            .cache_dir
            .clone()
            .unwrap_or_else(|| default_cache_dir(root));
        CacheStore::load(&dir, logger)
    });

    let scanner = Scanner {
        root,
        extractor,
        resolver: ImportResolver::new(root, options.monorepo),
        cache: cache.as_ref(),
        logger,
    };
    let scans: Vec<FileScan> = source_files.par_iter().map(|p| scanner.scan(p)).collect();

    let mut graph = DependencyGraph::new();
    let mut stats = BuildStats {
        files_scanned: scans.len(),
        ..BuildStats::default()
    };
    let mut files = Vec::with_capacity(scans.len());
    let mut staged = Vec::new();
    for scan in scans {
        if scan.read_error {
            stats.read_errors += 1;
        } else if scan.cache_hit {
            stats.cache_hits += 1;
        } else if scan.staged.is_some() {
            stats.cache_misses += 1;
        }
        for target in &scan.imports {
            graph.add_edge(&scan.rel, target);
        }
        graph.set_exports(&scan.rel, scan.exports);
        if let Some(entry) = scan.staged {
            staged.push((scan.rel.clone(), entry));
        }
        files.push(scan.rel);
    }

    if let Some(cache) = cache.as_mut() {
        for (rel, entry) in staged {
            cache.set(&rel, &entry.hash, entry.imports, entry.unresolved);
        }
        let keep: HashSet<String> = files.iter().cloned().collect();
        cache.prune(&keep);
        cache.save(logger);
    }

    logger.debug(&format!(
        "graph: {} files, {} edges ({} cached, {} parsed)",
        files.len(),
        graph.edge_count(),
        stats.cache_hits,
        stats.cache_misses
    ));

    BuildResult {
        graph,
        files,
        stats,
    }
}
