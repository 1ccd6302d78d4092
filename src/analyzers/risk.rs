//! Change-set risk scoring.
//!
//! A score is the sum of triggered [`RiskSignal`] weights. The level is a
//! threshold lookup: up to 3 is low, up to 7 medium, anything above high.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::{AnalysisContext, Analyzer};
use crate::config::Config;
use crate::glob::GlobList;
use crate::heuristics::folder::{FolderRisk, folder_risk, module_name};
use crate::heuristics::naming::is_test_file;

const LOW_MAX: f64 = 3.0;
const MEDIUM_MAX: f64 = 7.0;

const AUTH_KEYWORDS: &[&str] = &[
    "auth",
    "security",
    "password",
    "token",
    "jwt",
    "session",
    "login",
    "permission",
];
const DATABASE_KEYWORDS: &[&str] = &[
    "database",
    "migration",
    "schema",
    "model",
    "entity",
    "repository",
    ".sql",
];
const CONFIG_KEYWORDS: &[&str] = &["config", ".env", "settings", "constants"];
const SHARED_SEGMENTS: &[&str] = &["utils", "helpers", "lib", "shared", "common"];
const CORE_SEGMENTS: &[&str] = &["core", "kernel", "base", "main", "app"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= LOW_MAX {
            Self::Low
        } else if score <= MEDIUM_MAX {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSignal {
    pub signal: String,
    pub weight: f64,
    /// `"<label>: <detail>"`; the summary keeps only the label.
    pub description: String,
}

impl RiskSignal {
    fn new(signal: &str, weight: f64, description: String) -> Self {
        Self {
            signal: signal.to_string(),
            weight,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: f64,
    pub signals: Vec<RiskSignal>,
    pub summary: String,
}

impl RiskAssessment {
    fn from_signals(signals: Vec<RiskSignal>) -> Self {
        let score = signals.iter().map(|s| s.weight).sum();
        let level = RiskLevel::from_score(score);
        Self::with_level(level, score, signals)
    }

    fn with_level(level: RiskLevel, score: f64, signals: Vec<RiskSignal>) -> Self {
        let summary = summarize(level, &signals);
        Self {
            level,
            score,
            signals,
            summary,
        }
    }

    /// Merge two independently scored assessments: the higher level, the
    /// summed score, both signal lists.
    pub fn combine(a: &RiskAssessment, b: &RiskAssessment) -> RiskAssessment {
        let level = a.level.max(b.level);
        let signals: Vec<RiskSignal> = a.signals.iter().chain(&b.signals).cloned().collect();
        Self::with_level(level, a.score + b.score, signals)
    }
}

/// `"<LEVEL> risk: a, b, c"` from the three heaviest signals.
fn summarize(level: RiskLevel, signals: &[RiskSignal]) -> String {
    if signals.is_empty() {
        return format!("{level} risk");
    }
    let mut ranked: Vec<&RiskSignal> = signals.iter().collect();
    ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    let labels: Vec<&str> = ranked
        .iter()
        .take(3)
        .map(|s| s.description.split(':').next().unwrap_or_default().trim())
        .collect();
    format!("{level} risk: {}", labels.join(", "))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// First path containing any of `keywords` (case-insensitive substring).
fn first_with_keyword<'a>(paths: &[&'a str], keywords: &[&str]) -> Option<&'a str> {
    paths.iter().copied().find(|p| {
        let lower = p.to_ascii_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    })
}

/// Risk of changing `changed` (project-relative paths).
///
/// Test files are ignored; a change set made only of tests is low risk.
/// Weights come from `config.risk_weights` where present.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_risk<S: AsRef<str>>(changed: &[S], config: &Config) -> RiskAssessment {
    let sources: Vec<&str> = changed
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !is_test_file(p, &config.test_patterns))
        .collect();

    if sources.is_empty() {
        if changed.is_empty() {
            return RiskAssessment::from_signals(Vec::new());
        }
        return RiskAssessment::with_level(
            RiskLevel::Low,
            0.0,
            vec![RiskSignal::new(
                "only_tests",
                0.0,
                "only tests: no source files changed".to_string(),
            )],
        );
    }

    let low_risk = GlobList::new(&config.low_risk_files);
    let high_risk = GlobList::new(&config.high_risk_files);
    // Files declared low risk take no part in the path-based signals.
    let scored: Vec<&str> = sources
        .iter()
        .copied()
        .filter(|p| !low_risk.is_match(p))
        .collect();

    let mut signals = Vec::new();

    for path in &scored {
        match folder_risk(path, &config.folder_mappings) {
            Some(FolderRisk::High) => signals.push(RiskSignal::new(
                "high_risk_folder",
                config.weight("high_risk_folder", 3.0),
                format!("high-risk folder: {path}"),
            )),
            Some(FolderRisk::Medium) => signals.push(RiskSignal::new(
                "medium_risk_folder",
                config.weight("medium_risk_folder", 1.0),
                format!("medium-risk folder: {path}"),
            )),
            _ => {}
        }
    }

    if let Some(path) = first_with_keyword(&scored, AUTH_KEYWORDS) {
        signals.push(RiskSignal::new(
            "auth_security",
            config.weight("auth_security", 4.0),
            format!("authentication/security code: {path}"),
        ));
    }
    if let Some(path) = first_with_keyword(&scored, DATABASE_KEYWORDS) {
        signals.push(RiskSignal::new(
            "database",
            config.weight("database", 3.0),
            format!("database code: {path}"),
        ));
    }
    if let Some(path) = first_with_keyword(&scored, CONFIG_KEYWORDS) {
        signals.push(RiskSignal::new(
            "config",
            config.weight("config", 2.0),
            format!("configuration: {path}"),
        ));
    }
    if let Some(path) = scored.iter().find(|p| {
        segments(&p.to_ascii_lowercase()).any(|s| SHARED_SEGMENTS.contains(&s))
    }) {
        signals.push(RiskSignal::new(
            "shared_utility",
            config.weight("shared_utility", 2.0),
            format!("shared utility: {path}"),
        ));
    }
    if let Some(path) = scored.iter().find(|p| {
        let lower = p.to_ascii_lowercase();
        segments(&lower).any(|s| CORE_SEGMENTS.contains(&s))
            || CORE_SEGMENTS.iter().any(|c| file_name(&lower).starts_with(c))
    }) {
        signals.push(RiskSignal::new(
            "core_module",
            config.weight("core_module", 3.0),
            format!("core module: {path}"),
        ));
    }

    let modules: BTreeSet<String> = scored.iter().map(|p| module_name(p)).collect();
    if modules.len() > 1 {
        let extra = (modules.len() - 1) as f64;
        let names: Vec<&str> = modules.iter().map(String::as_str).collect();
        signals.push(RiskSignal::new(
            "cross_module",
            config.weight("cross_module", 2.0) * extra,
            format!("cross-module change: {} modules ({})", modules.len(), names.join(", ")),
        ));
    }

    if sources.len() >= 5 {
        let weight = (sources.len() - 4).min(3) as f64;
        signals.push(RiskSignal::new(
            "many_files",
            weight,
            format!("many files changed: {}", sources.len()),
        ));
    }

    if let Some(path) = sources.iter().find(|p| high_risk.is_match(p)) {
        signals.push(RiskSignal::new(
            "forced_high_risk",
            config.weight("forced_high_risk", 5.0),
            format!("configured high-risk file: {path}"),
        ));
    }

    RiskAssessment::from_signals(signals)
}

/// Risk from the volume of impacted tests alone. Scored on the same scale
/// as [`calculate_risk`]; combine the two with [`RiskAssessment::combine`].
#[allow(clippy::cast_precision_loss)]
pub fn calculate_risk_with_impact(unit_tests: usize, api_tests: usize) -> RiskAssessment {
    let mut signals = Vec::new();
    if unit_tests >= 10 {
        signals.push(RiskSignal::new(
            "many_unit_tests",
            (unit_tests / 5).min(3) as f64,
            format!("many unit tests impacted: {unit_tests}"),
        ));
    }
    if api_tests >= 5 {
        signals.push(RiskSignal::new(
            "many_api_tests",
            (api_tests / 2).min(3) as f64,
            format!("many API tests impacted: {api_tests}"),
        ));
    }
    RiskAssessment::from_signals(signals)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RiskCalculator;

impl RiskCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for RiskCalculator {
    type Output = RiskAssessment;

    fn name(&self) -> &'static str {
        "risk"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> RiskAssessment {
        let assessment = calculate_risk(&ctx.changed_paths(), ctx.config);
        ctx.logger.debug(&format!(
            "{}: {} (score {})",
            self.name(),
            assessment.level,
            assessment.score
        ));
        assessment
    }
}
