//! Test file detection and source-to-test naming conventions.

use std::collections::HashSet;

use crate::glob::matches_any;

pub const TEST_SUFFIXES: &[&str] = &[".spec", ".test"];
pub const TEST_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];
pub const TEST_DIRS: &[&str] = &["__tests__", "__test__", "test", "tests", "spec", "e2e"];

/// Subdirectories next to a source file where its tests conventionally live.
pub const COLOCATED_TEST_DIRS: &[&str] = &["__tests__", "test", "tests"];

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

fn split_dir(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}

fn split_ext(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// `name.spec.ts` and friends.
pub fn has_test_suffix(path: &str) -> bool {
    let (_, name) = split_dir(path);
    let (stem, ext) = split_ext(name);
    ext.is_some_and(|e| TEST_EXTENSIONS.contains(&e))
        && TEST_SUFFIXES.iter().any(|s| stem.ends_with(s))
}

/// Whether `path` is a test file. A non-empty `patterns` list replaces the
/// built-in suffix and folder rules.
pub fn is_test_file(path: &str, patterns: &[String]) -> bool {
    let path = normalize(path);
    if !patterns.is_empty() {
        return matches_any(&path, patterns);
    }
    if has_test_suffix(&path) {
        return true;
    }
    let (dir, _) = split_dir(&path);
    dir.split('/').any(|segment| TEST_DIRS.contains(&segment))
}

/// Base name a test file covers: `user.service.spec.ts` -> `user.service`,
/// `__tests__/user.ts` -> `user`.
pub fn strip_test_suffix(name: &str) -> &str {
    let (stem, _) = split_ext(name);
    TEST_SUFFIXES
        .iter()
        .find_map(|s| stem.strip_suffix(s))
        .filter(|s| !s.is_empty())
        .unwrap_or(stem)
}

/// Where tests for `source` are expected to live: next to it, in a
/// co-located test folder, and in a `tests/` or `test/` tree mirroring `src/`.
pub fn candidate_test_paths(source: &str) -> Vec<String> {
    let source = normalize(source);
    let (dir, name) = split_dir(&source);
    let (stem, ext) = split_ext(name);
    let ext = ext.unwrap_or("ts");

    let mut dirs: Vec<String> = vec![dir.to_string()];
    for sub in COLOCATED_TEST_DIRS {
        dirs.push(join(dir, sub));
    }
    let segments: Vec<&str> = dir.split('/').collect();
    if let Some(src) = segments.iter().position(|s| *s == "src") {
        for mirror in ["tests", "test"] {
            let mut mirrored = segments.clone();
            mirrored[src] = mirror;
            dirs.push(mirrored.join("/"));
        }
    }

    let mut out = Vec::with_capacity(dirs.len() * TEST_SUFFIXES.len());
    for dir in &dirs {
        for suffix in TEST_SUFFIXES {
            out.push(join(dir, &format!("{stem}{suffix}.{ext}")));
        }
    }
    out
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Test files among `files` that cover `source` by naming convention.
///
/// A test matches when its path is one of [`candidate_test_paths`]
/// (case-insensitive), or when its base name without the test suffix equals
/// the source's base name without extension.
pub fn match_test_files(source: &str, files: &[String], patterns: &[String]) -> Vec<String> {
    let source = normalize(source);
    let candidates: HashSet<String> = candidate_test_paths(&source)
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();
    let (_, name) = split_dir(&source);
    let (source_stem, _) = split_ext(name);

    files
        .iter()
        .filter(|f| normalize(f) != source && is_test_file(f, patterns))
        .filter(|f| {
            let f = normalize(f);
            if candidates.contains(&f.to_lowercase()) {
                return true;
            }
            let (_, test_name) = split_dir(&f);
            strip_test_suffix(test_name) == source_stem
        })
        .cloned()
        .collect()
}
