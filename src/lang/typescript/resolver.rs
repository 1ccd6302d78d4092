use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::monorepo::{self, MonorepoInfo};

/// Probe order for extensionless specifiers and directory indexes.
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Find the concrete file `candidate` refers to: the path itself, then
/// with each extension appended, then `index.<ext>` inside it.
pub fn probe_source_file(candidate: &Path) -> Option<PathBuf> {
    let candidate = candidate.clean();
    if candidate.is_file() {
        return Some(candidate);
    }
    let file_name = candidate.file_name()?.to_string_lossy().into_owned();
    for ext in RESOLVE_EXTENSIONS {
        let with_ext = candidate.with_file_name(format!("{file_name}.{ext}"));
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    if candidate.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let index = candidate.join(format!("index.{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    // ESM-in-TypeScript: `./foo.js` in source refers to `./foo.ts`.
    let ext = candidate.extension().and_then(|e| e.to_str());
    let alternatives: &[&str] = match ext {
        Some("js") => &["ts", "tsx"],
        Some("jsx") => &["tsx"],
        Some("mjs") => &["mts"],
        Some("cjs") => &["cts"],
        _ => &[],
    };
    alternatives
        .iter()
        .map(|alt| candidate.with_extension(alt))
        .find(|p| p.is_file())
}

/// Resolves import specifiers to files inside one project.
#[derive(Debug)]
pub struct ImportResolver<'a> {
    root: PathBuf,
    monorepo: Option<&'a MonorepoInfo>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(root: &Path, monorepo: Option<&'a MonorepoInfo>) -> Self {
        Self {
            root: root.to_path_buf(),
            monorepo: monorepo.filter(|m| m.is_monorepo),
        }
    }

    /// Resolve `specifier` as written in a file inside `source_dir`.
    /// `None` for external packages (including node builtins) and anything
    /// that does not exist on disk.
    pub fn resolve(&self, source_dir: &Path, specifier: &str) -> Option<PathBuf> {
        if let Some(rest) = specifier
            .strip_prefix("@/")
            .or_else(|| specifier.strip_prefix("~/"))
        {
            return probe_source_file(&self.root.join("src").join(rest));
        }

        if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
        {
            return probe_source_file(&source_dir.join(specifier));
        }

        if let Some(rest) = specifier.strip_prefix('/') {
            return probe_source_file(&self.root.join(rest));
        }

        // Bare specifier: only internal workspace packages are part of the graph.
        let info = self.monorepo?;
        let (name, _) = monorepo::split_package_specifier(specifier)?;
        info.workspace(name)?;
        monorepo::resolve_package_import(specifier, info)
    }
}
