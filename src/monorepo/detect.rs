use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use ignore::WalkBuilder;
use saphyr::LoadableYamlNode;

use super::{MonorepoInfo, MonorepoKind, PackageManifest, Workspace};
use crate::glob::GlobList;
use crate::logger::Logger;

const DEFAULT_PATTERNS: &[&str] = &["packages/*", "apps/*", "libs/*"];
const SKIP_DIRS: &[&str] = &["node_modules", ".git"];

fn read_manifest(path: &Path, logger: &dyn Logger) -> Option<PackageManifest> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            logger.warn(&format!("ignoring unparseable {}: {e}", path.display()));
            None
        }
    }
}

fn pnpm_patterns(root: &Path, logger: &dyn Logger) -> Option<Vec<String>> {
    let path = root.join("pnpm-workspace.yaml");
    let content = fs::read_to_string(&path).ok()?;
    let docs = match saphyr::Yaml::load_from_str(&content) {
        Ok(docs) => docs,
        Err(e) => {
            logger.warn(&format!("ignoring unparseable {}: {e}", path.display()));
            return None;
        }
    };
    let doc = docs.first()?;
    let packages = doc["packages"].as_vec()?;
    Some(
        packages
            .iter()
            .filter_map(|item| item.as_str().map(ToString::to_string))
            .collect(),
    )
}

fn lerna_patterns(root: &Path) -> Option<Vec<String>> {
    let content = fs::read_to_string(root.join("lerna.json")).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    let packages = value.get("packages")?.as_array()?;
    Some(
        packages
            .iter()
            .filter_map(|p| p.as_str().map(ToString::to_string))
            .collect(),
    )
}

/// Kind and workspace patterns for the root. Kind follows the first marker
/// present in the order pnpm, npm/yarn `workspaces`, lerna, nx, turbo; patterns
/// come from the first source that declares any.
fn discover_patterns(
    root: &Path,
    manifest: &PackageManifest,
    logger: &dyn Logger,
) -> Option<(MonorepoKind, Vec<String>)> {
    let has_pnpm = root.join("pnpm-workspace.yaml").is_file();
    let has_workspaces = manifest.workspaces.is_some();
    let has_lerna = root.join("lerna.json").is_file();

    let kind = if has_pnpm {
        MonorepoKind::Pnpm
    } else if has_workspaces {
        MonorepoKind::Npm
    } else if has_lerna {
        MonorepoKind::Lerna
    } else if root.join("nx.json").is_file() {
        MonorepoKind::Nx
    } else if root.join("turbo.json").is_file() {
        MonorepoKind::Turbo
    } else {
        return None;
    };

    let declared = has_pnpm
        .then(|| pnpm_patterns(root, logger))
        .flatten()
        .or_else(|| {
            manifest
                .workspaces
                .as_ref()
                .map(|spec| spec.patterns().to_vec())
        })
        .or_else(|| has_lerna.then(|| lerna_patterns(root)).flatten())
        .filter(|patterns| !patterns.is_empty());

    let patterns = declared
        .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(ToString::to_string).collect());
    Some((kind, patterns))
}

fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
    pattern.to_string()
}

/// Relative directories (forward slashes) matching the include patterns and
/// none of the `!` excludes.
fn expand_patterns(root: &Path, patterns: &[String]) -> BTreeSet<String> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for pattern in patterns {
        match pattern.trim().strip_prefix('!') {
            Some(negated) => exclude.push(normalize_pattern(negated)),
            None => include.push(normalize_pattern(pattern)),
        }
    }
    include.retain(|p| !p.is_empty());
    if include.is_empty() {
        return BTreeSet::new();
    }

    let max_depth = if include.iter().any(|p| p.contains("**")) {
        None
    } else {
        include.iter().map(|p| p.split('/').count()).max()
    };
    let include = GlobList::new(&include);
    let exclude = GlobList::new(&exclude);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .max_depth(max_depth)
        .filter_entry(|entry| {
            !entry
                .file_name()
                .to_str()
                .is_some_and(|n| SKIP_DIRS.contains(&n))
        })
        .build();

    let mut dirs = BTreeSet::new();
    for entry in walker.flatten() {
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if include.is_match(&rel) && !exclude.is_match(&rel) {
            dirs.insert(rel);
        }
    }
    dirs
}

/// Inspect the manifests under `root` and build the workspace map.
///
/// Never fails: a missing or unreadable root `package.json` means "not a
/// monorepo", and unreadable package manifests are skipped with a warning.
pub fn detect_monorepo(root: &Path, logger: &dyn Logger) -> MonorepoInfo {
    let mut info = MonorepoInfo::single(root);
    let root_manifest = root.join("package.json");
    if !root_manifest.is_file() {
        return info;
    }
    let manifest = read_manifest(&root_manifest, logger).unwrap_or_default();
    let Some((kind, patterns)) = discover_patterns(root, &manifest, logger) else {
        return info;
    };
    info.is_monorepo = true;
    info.kind = kind;

    for rel in expand_patterns(root, &patterns) {
        let dir = root.join(&rel);
        let Some(manifest) = read_manifest(&dir.join("package.json"), logger) else {
            continue;
        };
        let Some(name) = manifest.name.clone().filter(|n| !n.is_empty()) else {
            continue;
        };
        if let Some(existing) = info.workspace(&name) {
            logger.warn(&format!(
                "duplicate workspace name {name} in {rel}, keeping {}",
                existing.relative_path
            ));
            continue;
        }
        info.package_map.insert(name.clone(), info.workspaces.len());
        info.workspaces.push(Workspace {
            name,
            path: dir,
            relative_path: rel,
            internal_dependencies: BTreeSet::new(),
            depended_by: BTreeSet::new(),
            manifest,
        });
    }

    let edges: Vec<(String, String)> = info
        .workspaces
        .iter()
        .flat_map(|ws| {
            ws.manifest
                .dependency_names()
                .map(move |dep| (ws.name.clone(), dep.to_string()))
        })
        .collect();
    for (dependent, dependency) in edges {
        info.link(&dependent, &dependency);
    }

    logger.debug(&format!(
        "detected {} monorepo with {} workspaces",
        info.kind.as_str(),
        info.workspaces.len()
    ));
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{Level, MemoryLogger, NullLogger};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn names(info: &MonorepoInfo) -> Vec<&str> {
        info.workspaces.iter().map(|w| w.name.as_str()).collect()
    }

    #[test]
    fn no_root_manifest_is_single_package() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "packages/a/package.json", r#"{"name":"a"}"#);
        let info = detect_monorepo(&root, &NullLogger);
        assert!(!info.is_monorepo);
        assert_eq!(info.kind, MonorepoKind::Unknown);
    }

    #[test]
    fn plain_package_is_not_a_monorepo() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"name":"app"}"#);
        assert!(!detect_monorepo(&root, &NullLogger).is_monorepo);
    }

    #[test]
    fn npm_workspaces_with_internal_deps() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"name":"root","workspaces":["packages/*"]}"#);
        write(&root, "packages/ui/package.json", r#"{"name":"@app/ui"}"#);
        write(
            &root,
            "packages/web/package.json",
            r#"{"name":"@app/web","dependencies":{"@app/ui":"*","react":"^18"}}"#,
        );
        write(&root, "packages/notes/README.md", "no manifest");

        let info = detect_monorepo(&root, &NullLogger);
        assert!(info.is_monorepo);
        assert_eq!(info.kind, MonorepoKind::Npm);
        assert_eq!(names(&info), vec!["@app/ui", "@app/web"]);
        let ui = info.workspace("@app/ui").unwrap();
        assert_eq!(ui.relative_path, "packages/ui");
        assert!(ui.depended_by.contains("@app/web"));
        let web = info.workspace("@app/web").unwrap();
        assert_eq!(web.internal_dependencies.len(), 1);
    }

    #[test]
    fn yarn_object_form_and_negation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(
            &root,
            "package.json",
            r#"{"workspaces":{"packages":["packages/*","!packages/legacy"]}}"#,
        );
        write(&root, "packages/a/package.json", r#"{"name":"a"}"#);
        write(&root, "packages/legacy/package.json", r#"{"name":"legacy"}"#);
        let info = detect_monorepo(&root, &NullLogger);
        assert_eq!(names(&info), vec!["a"]);
    }

    #[test]
    fn pnpm_takes_priority_over_workspaces() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"workspaces":["apps/*"]}"#);
        write(&root, "pnpm-workspace.yaml", "packages:\n  - 'libs/*'\n");
        write(&root, "apps/web/package.json", r#"{"name":"web"}"#);
        write(&root, "libs/core/package.json", r#"{"name":"core"}"#);
        let info = detect_monorepo(&root, &NullLogger);
        assert_eq!(info.kind, MonorepoKind::Pnpm);
        assert_eq!(names(&info), vec!["core"]);
    }

    #[test]
    fn nx_without_patterns_uses_conventional_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"name":"root"}"#);
        write(&root, "nx.json", "{}");
        write(&root, "apps/web/package.json", r#"{"name":"web"}"#);
        write(&root, "libs/util/package.json", r#"{"name":"util"}"#);
        write(&root, "tools/gen/package.json", r#"{"name":"gen"}"#);
        let info = detect_monorepo(&root, &NullLogger);
        assert_eq!(info.kind, MonorepoKind::Nx);
        assert_eq!(names(&info), vec!["web", "util"]);
    }

    #[test]
    fn lerna_packages_field() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", "{}");
        write(&root, "lerna.json", r#"{"packages":["modules/*"]}"#);
        write(&root, "modules/x/package.json", r#"{"name":"x"}"#);
        let info = detect_monorepo(&root, &NullLogger);
        assert_eq!(info.kind, MonorepoKind::Lerna);
        assert_eq!(names(&info), vec!["x"]);
    }

    #[test]
    fn recursive_pattern_skips_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"workspaces":["packages/**"]}"#);
        write(&root, "packages/group/a/package.json", r#"{"name":"a"}"#);
        write(
            &root,
            "packages/group/a/node_modules/dep/package.json",
            r#"{"name":"dep"}"#,
        );
        let info = detect_monorepo(&root, &NullLogger);
        assert_eq!(names(&info), vec!["a"]);
    }

    #[test]
    fn broken_package_manifest_warns_and_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write(&root, "package.json", r#"{"workspaces":["packages/*"]}"#);
        write(&root, "packages/bad/package.json", "{ not json");
        write(&root, "packages/good/package.json", r#"{"name":"good"}"#);
        let logger = MemoryLogger::new();
        let info = detect_monorepo(&root, &logger);
        assert_eq!(names(&info), vec!["good"]);
        assert_eq!(logger.messages(Level::Warn).len(), 1);
    }
}
