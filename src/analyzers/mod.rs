//! Analyzers turn a change set plus the dependency graph into results.
//!
//! Every analyzer implements [`Analyzer`] over the same
//! [`AnalysisContext`], so the pipeline can run them side by side.

pub mod risk;
pub mod route;
pub mod unit;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::change::ChangedFile;
use crate::config::Config;
use crate::graph::DependencyGraph;
use crate::logger::Logger;

pub use risk::{RiskAssessment, RiskCalculator, RiskLevel, RiskSignal};
pub use route::RouteTestAnalyzer;
pub use unit::UnitTestAnalyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    DirectChange,
    ImportsChanged,
    NamingConvention,
    FolderConvention,
    RouteMatch,
    TagMatch,
}

impl ReasonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectChange => "direct_change",
            Self::ImportsChanged => "imports_changed",
            Self::NamingConvention => "naming_convention",
            Self::FolderConvention => "folder_convention",
            Self::RouteMatch => "route_match",
            Self::TagMatch => "tag_match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReason {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_file: Option<String>,
}

impl ImpactReason {
    pub fn new(kind: ReasonKind, description: impl Into<String>, related_file: Option<&str>) -> Self {
        Self {
            kind,
            description: description.into(),
            related_file: related_file.map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactedFile {
    pub path: String,
    pub reasons: Vec<ImpactReason>,
}

impl ImpactedFile {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            reasons: Vec::new(),
        }
    }

    /// Adds `reason` unless one with the same kind and related file is
    /// already attached. Returns whether it was added.
    pub fn add_reason(&mut self, reason: ImpactReason) -> bool {
        let duplicate = self
            .reasons
            .iter()
            .any(|r| r.kind == reason.kind && r.related_file == reason.related_file);
        if !duplicate {
            self.reasons.push(reason);
        }
        !duplicate
    }

    pub fn has_reason(&self, kind: ReasonKind) -> bool {
        self.reasons.iter().any(|r| r.kind == kind)
    }
}

/// Accumulates reasons per file.
#[derive(Debug, Default)]
pub struct ImpactMap {
    files: BTreeMap<String, ImpactedFile>,
}

impl ImpactMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, reason: ImpactReason) -> bool {
        self.files
            .entry(path.to_string())
            .or_insert_with(|| ImpactedFile::new(path))
            .add_reason(reason)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn extend(&mut self, files: impl IntoIterator<Item = ImpactedFile>) {
        for file in files {
            for reason in file.reasons {
                self.add(&file.path, reason);
            }
        }
    }

    /// Most corroborated files first; ties by path.
    pub fn into_sorted(self) -> Vec<ImpactedFile> {
        let mut files: Vec<ImpactedFile> = self.files.into_values().collect();
        files.sort_by(|a, b| {
            b.reasons
                .len()
                .cmp(&a.reasons.len())
                .then_with(|| a.path.cmp(&b.path))
        });
        files
    }
}

/// Everything an analyzer may look at. Borrowed for one run.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub changed_files: &'a [ChangedFile],
    pub graph: &'a DependencyGraph,
    pub project_root: &'a Path,
    /// Every scanned file, project-relative.
    pub all_files: &'a [String],
    pub config: &'a Config,
    pub logger: &'a dyn Logger,
}

impl AnalysisContext<'_> {
    pub fn is_test_file(&self, path: &str) -> bool {
        crate::heuristics::naming::is_test_file(path, &self.config.test_patterns)
    }

    pub fn changed_paths(&self) -> Vec<&str> {
        self.changed_files.iter().map(|f| f.path.as_str()).collect()
    }
}

pub trait Analyzer {
    type Output;

    fn name(&self) -> &'static str;

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Self::Output;
}
