//! Workspace layout of JS/TS monorepos.
//!
//! [`detect_monorepo`] reads the root manifests once per run and produces a
//! read-only [`MonorepoInfo`]. The rest of this module answers questions
//! against it: which package owns a file, which packages are downstream of
//! a change, and which file a package-name import lands on.

mod detect;
mod exports;

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use detect::detect_monorepo;
pub use exports::resolve_package_import;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonorepoKind {
    Npm,
    Pnpm,
    Lerna,
    Nx,
    Turbo,
    Unknown,
}

impl MonorepoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Lerna => "lerna",
            Self::Nx => "nx",
            Self::Turbo => "turbo",
            Self::Unknown => "unknown",
        }
    }
}

/// `package.json`, reduced to the fields the resolver reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,
    pub main: Option<String>,
    pub module: Option<String>,
    pub exports: Option<serde_json::Value>,
    pub workspaces: Option<WorkspaceSpec>,
    pub dependencies: HashMap<String, serde_json::Value>,
    pub dev_dependencies: HashMap<String, serde_json::Value>,
    pub peer_dependencies: HashMap<String, serde_json::Value>,
}

/// npm/yarn accept both `"workspaces": [...]` and
/// `"workspaces": { "packages": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspaceSpec {
    Array(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspaceSpec {
    pub fn patterns(&self) -> &[String] {
        match self {
            WorkspaceSpec::Array(patterns) => patterns,
            WorkspaceSpec::Object { packages } => packages,
        }
    }
}

impl PackageManifest {
    /// Every dependency key, across all three dependency tables.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub name: String,
    /// Absolute package directory.
    pub path: PathBuf,
    /// Package directory relative to the monorepo root, forward slashes.
    pub relative_path: String,
    /// Workspace packages this one depends on.
    pub internal_dependencies: BTreeSet<String>,
    /// Workspace packages depending on this one; mirror of `internal_dependencies`.
    pub depended_by: BTreeSet<String>,
    #[serde(skip)]
    pub manifest: PackageManifest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonorepoInfo {
    pub is_monorepo: bool,
    pub root_path: PathBuf,
    #[serde(rename = "type")]
    pub kind: MonorepoKind,
    pub workspaces: Vec<Workspace>,
    /// name -> index into `workspaces`
    #[serde(skip)]
    pub package_map: HashMap<String, usize>,
}

impl MonorepoInfo {
    pub fn single(root: &Path) -> Self {
        Self {
            is_monorepo: false,
            root_path: root.to_path_buf(),
            kind: MonorepoKind::Unknown,
            workspaces: Vec::new(),
            package_map: HashMap::new(),
        }
    }

    pub fn workspace(&self, name: &str) -> Option<&Workspace> {
        self.package_map.get(name).map(|&i| &self.workspaces[i])
    }

    /// `internal_dependencies` on the dependent, `depended_by` on the dependency.
    fn link(&mut self, dependent: &str, dependency: &str) {
        if dependent == dependency {
            return;
        }
        let (Some(&from), Some(&to)) = (
            self.package_map.get(dependent),
            self.package_map.get(dependency),
        ) else {
            return;
        };
        self.workspaces[from]
            .internal_dependencies
            .insert(dependency.to_string());
        self.workspaces[to].depended_by.insert(dependent.to_string());
    }
}

/// The workspace owning `path`. Relative paths are taken relative to the
/// monorepo root. With nested packages the innermost directory wins.
pub fn package_for_file<'a>(path: &Path, info: &'a MonorepoInfo) -> Option<&'a Workspace> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        info.root_path.join(path)
    };
    info.workspaces
        .iter()
        .filter(|ws| absolute.starts_with(&ws.path))
        .max_by_key(|ws| ws.path.components().count())
}

/// `changed` plus every package that transitively depends on one of them.
pub fn affected_packages<S: AsRef<str>>(changed: &[S], info: &MonorepoInfo) -> BTreeSet<String> {
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for name in changed {
        let name = name.as_ref().to_string();
        if visited.insert(name.clone()) {
            queue.push_back(name);
        }
    }
    while let Some(name) = queue.pop_front() {
        let Some(ws) = info.workspace(&name) else {
            continue;
        };
        for dependent in &ws.depended_by {
            if visited.insert(dependent.clone()) {
                queue.push_back(dependent.clone());
            }
        }
    }
    visited
}

/// Split a bare specifier into package name and subpath (`""` for the
/// package root). `@scope/name` takes two segments, anything else one.
pub fn split_package_specifier(specifier: &str) -> Option<(&str, &str)> {
    if specifier.is_empty() || specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }
    let name_len = if specifier.starts_with('@') {
        let slash = specifier.find('/')?;
        if slash == 1 {
            return None;
        }
        specifier[slash + 1..]
            .find('/')
            .map_or(specifier.len(), |i| slash + 1 + i)
    } else {
        specifier.find('/').unwrap_or(specifier.len())
    };
    let (name, rest) = specifier.split_at(name_len);
    if name.ends_with('/') {
        return None;
    }
    Some((name, rest.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(root: &Path, name: &str, rel: &str) -> Workspace {
        Workspace {
            name: name.to_string(),
            path: root.join(rel),
            relative_path: rel.to_string(),
            internal_dependencies: BTreeSet::new(),
            depended_by: BTreeSet::new(),
            manifest: PackageManifest::default(),
        }
    }

    fn info(root: &Path, packages: &[(&str, &str)], edges: &[(&str, &str)]) -> MonorepoInfo {
        let mut info = MonorepoInfo::single(root);
        info.is_monorepo = true;
        info.kind = MonorepoKind::Npm;
        for (name, rel) in packages {
            info.package_map.insert((*name).to_string(), info.workspaces.len());
            info.workspaces.push(workspace(root, name, rel));
        }
        for (dependent, dependency) in edges {
            info.link(dependent, dependency);
        }
        info
    }

    #[test]
    fn split_scoped_and_plain_names() {
        assert_eq!(split_package_specifier("@app/ui"), Some(("@app/ui", "")));
        assert_eq!(
            split_package_specifier("@app/ui/button"),
            Some(("@app/ui", "button"))
        );
        assert_eq!(split_package_specifier("lodash"), Some(("lodash", "")));
        assert_eq!(
            split_package_specifier("lodash/fp/map"),
            Some(("lodash", "fp/map"))
        );
        assert_eq!(split_package_specifier("@scope"), None);
        assert_eq!(split_package_specifier("./local"), None);
        assert_eq!(split_package_specifier(""), None);
    }

    #[test]
    fn link_mirrors_edges() {
        let root = Path::new("/repo");
        let info = info(
            root,
            &[("@app/ui", "packages/ui"), ("@app/web", "apps/web")],
            &[("@app/web", "@app/ui")],
        );
        let ui = info.workspace("@app/ui").unwrap();
        let web = info.workspace("@app/web").unwrap();
        assert!(ui.depended_by.contains("@app/web"));
        assert!(web.internal_dependencies.contains("@app/ui"));
        assert!(ui.internal_dependencies.is_empty());
    }

    #[test]
    fn affected_packages_follows_dependents() {
        let root = Path::new("/repo");
        // web -> ui -> tokens, docs -> ui
        let info = info(
            root,
            &[
                ("tokens", "packages/tokens"),
                ("ui", "packages/ui"),
                ("web", "apps/web"),
                ("docs", "apps/docs"),
                ("api", "apps/api"),
            ],
            &[("ui", "tokens"), ("web", "ui"), ("docs", "ui")],
        );
        let affected = affected_packages(&["tokens"], &info);
        assert_eq!(
            affected.into_iter().collect::<Vec<_>>(),
            vec!["docs", "tokens", "ui", "web"]
        );
        assert_eq!(affected_packages(&["api"], &info).len(), 1);
    }

    #[test]
    fn affected_packages_terminates_on_cycles() {
        let root = Path::new("/repo");
        let info = info(
            root,
            &[("a", "packages/a"), ("b", "packages/b")],
            &[("a", "b"), ("b", "a")],
        );
        assert_eq!(affected_packages(&["a"], &info).len(), 2);
    }

    #[test]
    fn package_for_file_prefers_innermost() {
        let root = Path::new("/repo");
        let info = info(
            root,
            &[("outer", "packages/outer"), ("inner", "packages/outer/inner")],
            &[],
        );
        let found = package_for_file(Path::new("packages/outer/inner/src/a.ts"), &info);
        assert_eq!(found.map(|ws| ws.name.as_str()), Some("inner"));
        let found = package_for_file(Path::new("/repo/packages/outer/src/b.ts"), &info);
        assert_eq!(found.map(|ws| ws.name.as_str()), Some("outer"));
        assert!(package_for_file(Path::new("scripts/x.ts"), &info).is_none());
    }

    #[test]
    fn package_for_file_matches_whole_components() {
        let root = Path::new("/repo");
        let info = info(root, &[("ui", "packages/ui")], &[]);
        assert!(package_for_file(Path::new("packages/ui-kit/a.ts"), &info).is_none());
    }
}
