use std::collections::BTreeMap;

use serde::Serialize;

const HIGH_RISK: &[&str] = &["auth", "security", "core", "database", "config", "migrations"];
const MEDIUM_RISK: &[&str] = &["services", "controllers", "middleware", "api", "routes", "handlers"];
const LOW_RISK: &[&str] = &["utils", "helpers", "lib", "common", "shared", "types", "constants"];

/// Leading segments that say nothing about which module a file belongs to.
const ROOT_SEGMENTS: &[&str] = &["src", "lib", "app", "packages"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderRisk {
    Low,
    Medium,
    High,
}

impl FolderRisk {
    pub fn parse(tier: &str) -> Option<Self> {
        match tier.to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

fn directory_segments(path: &str) -> Vec<String> {
    let path = path.replace('\\', "/");
    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_ascii_lowercase)
        .collect();
    segments.pop();
    segments
}

/// Risk tier of the folders `path` lives in.
///
/// `mappings` (folder name -> tier) is consulted first; then the built-in
/// word lists, high before medium before low. A segment matches a word when
/// it contains it, so `auth-service/` counts as `auth`.
pub fn folder_risk(path: &str, mappings: &BTreeMap<String, String>) -> Option<FolderRisk> {
    let segments = directory_segments(path);
    for segment in &segments {
        let mapped = mappings
            .iter()
            .find(|(folder, _)| folder.eq_ignore_ascii_case(segment))
            .and_then(|(_, tier)| FolderRisk::parse(tier));
        if mapped.is_some() {
            return mapped;
        }
    }
    [
        (FolderRisk::High, HIGH_RISK),
        (FolderRisk::Medium, MEDIUM_RISK),
        (FolderRisk::Low, LOW_RISK),
    ]
    .into_iter()
    .find(|(_, words)| {
        segments
            .iter()
            .any(|segment| words.iter().any(|w| segment.contains(w)))
    })
    .map(|(tier, _)| tier)
}

/// First directory below the conventional roots; `"root"` for files that
/// sit directly in one.
pub fn module_name(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    // the file itself
    segments.pop();
    segments
        .into_iter()
        .find(|s| !ROOT_SEGMENTS.contains(s))
        .map_or_else(|| "root".to_string(), ToString::to_string)
}
