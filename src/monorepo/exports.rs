use std::path::PathBuf;

use serde_json::Value;

use super::{MonorepoInfo, Workspace, split_package_specifier};
use crate::lang::typescript::resolver::probe_source_file;

/// Condition keys tried, in order, when an export target is an object.
const CONDITIONS: &[&str] = &["import", "require", "default", "types", "node"];

const ROOT_ENTRY_FALLBACKS: &[&str] = &["src/index.ts", "src/index.js", "index.ts", "index.js"];

/// Resolve a bare import of an internal workspace package to a file.
///
/// With an `exports` map only what the map exposes resolves. Without one the
/// package root goes through `main`, `module` and the conventional index
/// files, and a subpath is looked up in the package directory, then `src/`.
pub fn resolve_package_import(specifier: &str, info: &MonorepoInfo) -> Option<PathBuf> {
    let (name, subpath) = split_package_specifier(specifier)?;
    let ws = info.workspace(name)?;

    if let Some(exports) = &ws.manifest.exports {
        let key = if subpath.is_empty() {
            ".".to_string()
        } else {
            format!("./{subpath}")
        };
        let target = match_exports(exports, &key)?;
        return probe_source_file(&ws.path.join(target));
    }

    if subpath.is_empty() {
        resolve_root_entry(ws)
    } else {
        probe_source_file(&ws.path.join(subpath))
            .or_else(|| probe_source_file(&ws.path.join("src").join(subpath)))
    }
}

fn resolve_root_entry(ws: &Workspace) -> Option<PathBuf> {
    let declared = [ws.manifest.main.as_deref(), ws.manifest.module.as_deref()];
    declared
        .into_iter()
        .flatten()
        .chain(ROOT_ENTRY_FALLBACKS.iter().copied())
        .find_map(|entry| probe_source_file(&ws.path.join(entry)))
}

/// `true` when the object is a subpath map (`".": ..., "./x": ...`) rather
/// than a condition map.
fn is_subpath_map(map: &serde_json::Map<String, Value>) -> bool {
    map.keys().any(|k| k.starts_with('.'))
}

/// Target path for `key` (`"."` or `"./sub"`), before existence checks.
fn match_exports(exports: &Value, key: &str) -> Option<String> {
    let map = match exports {
        Value::Object(map) if is_subpath_map(map) => map,
        // String, array, or condition object: sugar for `{ ".": exports }`
        _ => return (key == ".").then(|| target_path(exports)).flatten(),
    };

    if let Some(target) = map.get(key) {
        return target_path(target);
    }

    // Single-wildcard patterns; the longest matching prefix wins.
    let (pattern_target, captured) = map
        .iter()
        .filter_map(|(pattern, target)| {
            let (prefix, suffix) = pattern.split_once('*')?;
            if suffix.contains('*') || key.len() < prefix.len() + suffix.len() {
                return None;
            }
            let captured = key.strip_prefix(prefix)?.strip_suffix(suffix)?;
            Some((prefix.len(), target, captured))
        })
        .max_by_key(|(prefix_len, _, _)| *prefix_len)
        .map(|(_, target, captured)| (target, captured))?;

    target_path(pattern_target).map(|t| t.replace('*', captured))
}

/// First usable string in a target: strings as-is, arrays in order, condition
/// objects by [`CONDITIONS`]. `null` blocks the export.
fn target_path(target: &Value) -> Option<String> {
    match target {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(target_path),
        Value::Object(conditions) => CONDITIONS
            .iter()
            .find_map(|c| conditions.get(*c).and_then(target_path)),
        _ => None,
    }
}
