//! One analysis run: config in, report out.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analyzers::{
    AnalysisContext, Analyzer, ImpactMap, ImpactedFile, RiskAssessment, RiskCalculator,
    RouteTestAnalyzer, UnitTestAnalyzer,
};
use crate::analyzers::risk::calculate_risk_with_impact;
use crate::change::{ChangedFile, normalize_path};
use crate::config::Config;
use crate::error::Error;
use crate::logger::Logger;
use crate::monorepo::{MonorepoInfo, affected_packages, detect_monorepo, package_for_file};
use crate::walker::{BuildOptions, BuildStats, build_dependency_graph};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub no_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub project_root: PathBuf,
    pub changed_files: Vec<ChangedFile>,
    /// Present only for multi-package repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monorepo: Option<MonorepoInfo>,
    /// Packages owning a changed file plus everything depending on them.
    pub affected_packages: Vec<String>,
    pub impacted_tests: Vec<ImpactedFile>,
    pub unit_test_count: usize,
    pub api_test_count: usize,
    pub risk: RiskAssessment,
    pub graph_files: usize,
    pub graph_edges: usize,
    pub stats: BuildStats,
    pub warnings: Vec<String>,
}

/// Canonical project root, or the reason it cannot be used.
pub fn resolve_root(root: &Path) -> Result<PathBuf, Error> {
    let meta = fs::metadata(root).map_err(|e| Error::RootNotFound(root.to_path_buf(), e))?;
    if !meta.is_dir() {
        return Err(Error::RootNotDirectory(root.to_path_buf()));
    }
    root.canonicalize()
        .map_err(|e| Error::RootNotFound(root.to_path_buf(), e))
}

/// Rewrite absolute paths under `root` as project-relative.
fn relativize(root: &Path, changed: &[ChangedFile]) -> Vec<ChangedFile> {
    let rel = |p: &str| -> String {
        let path = Path::new(p);
        if path.is_absolute()
            && let Ok(stripped) = path.strip_prefix(root)
        {
            return normalize_path(&stripped.to_string_lossy());
        }
        p.to_string()
    };
    changed
        .iter()
        .map(|f| ChangedFile {
            path: rel(&f.path),
            change_type: f.change_type,
            old_path: f.old_path.as_deref().map(rel),
        })
        .collect()
}

/// Run every analyzer over `changed` and assemble the report.
///
/// Only an unusable root or a root without any TS/JS source fails the run;
/// everything else degrades to warnings.
pub fn run(
    root: &Path,
    changed: &[ChangedFile],
    config: &Config,
    options: RunOptions,
    logger: &dyn Logger,
) -> Result<AnalysisReport, Error> {
    let root = resolve_root(root)?;
    let warnings = config.validate();
    for warning in &warnings {
        logger.warn(warning);
    }
    let changed = relativize(&root, changed);

    let monorepo = detect_monorepo(&root, logger);
    if monorepo.is_monorepo {
        logger.info(&format!(
            "{} monorepo with {} workspaces",
            monorepo.kind.as_str(),
            monorepo.workspaces.len()
        ));
    }

    let build = build_dependency_graph(
        &root,
        &BuildOptions {
            no_cache: options.no_cache,
            monorepo: Some(&monorepo),
            ignore_patterns: &config.ignore_patterns,
            cache_dir: Some(config.cache_dir(&root)),
        },
        logger,
    );
    if build.files.is_empty() {
        return Err(Error::NoSourceFiles(root));
    }

    let owners: BTreeSet<&str> = changed
        .iter()
        .filter_map(|f| package_for_file(Path::new(&f.path), &monorepo))
        .map(|ws| ws.name.as_str())
        .collect();
    let owners: Vec<&str> = owners.into_iter().collect();
    let packages: Vec<String> = affected_packages(&owners, &monorepo).into_iter().collect();

    let ctx = AnalysisContext {
        changed_files: &changed,
        graph: &build.graph,
        project_root: &root,
        all_files: &build.files,
        config,
        logger,
    };
    let unit = UnitTestAnalyzer::new().analyze(&ctx);
    let api = RouteTestAnalyzer::new().analyze(&ctx);
    let (unit_test_count, api_test_count) = (unit.len(), api.len());

    let mut impacts = ImpactMap::new();
    impacts.extend(unit);
    impacts.extend(api);
    let impacted_tests = impacts.into_sorted();

    let risk = RiskAssessment::combine(
        &RiskCalculator::new().analyze(&ctx),
        &calculate_risk_with_impact(unit_test_count, api_test_count),
    );

    logger.info(&format!(
        "{} changed files: {} impacted tests, {} risk",
        changed.len(),
        impacted_tests.len(),
        risk.level
    ));

    Ok(AnalysisReport {
        graph_files: build.files.len(),
        graph_edges: build.graph.edge_count(),
        stats: build.stats,
        monorepo: monorepo.is_monorepo.then_some(monorepo),
        project_root: root,
        changed_files: changed,
        affected_packages: packages,
        impacted_tests,
        unit_test_count,
        api_test_count,
        risk,
        warnings,
    })
}
