use std::collections::HashSet;

use super::{AnalysisContext, Analyzer, ImpactMap, ImpactReason, ImpactedFile, ReasonKind};
use crate::graph::{DependencyGraph, affected_files};
use crate::heuristics::naming::{COLOCATED_TEST_DIRS, match_test_files};

/// Unit tests touched by a change set.
///
/// Combines direct edits to tests, naming conventions, import-graph
/// propagation and co-located test folders into one reasoned list.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitTestAnalyzer;

impl UnitTestAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

/// The changed file closest to `file` along its own imports: one hop, then
/// two, else `fallback`.
fn nearest_changed<'a>(
    graph: &'a DependencyGraph,
    file: &str,
    changed: &HashSet<&str>,
    fallback: &'a str,
) -> &'a str {
    if let Some(hit) = graph.imports_of(file).find(|dep| changed.contains(dep)) {
        return hit;
    }
    graph
        .imports_of(file)
        .find_map(|dep| graph.imports_of(dep).find(|d| changed.contains(d)))
        .unwrap_or(fallback)
}

impl Analyzer for UnitTestAnalyzer {
    type Output = Vec<ImpactedFile>;

    fn name(&self) -> &'static str {
        "unit"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<ImpactedFile> {
        let mut impacts = ImpactMap::new();
        let patterns = &ctx.config.test_patterns;

        // Changed tests run themselves.
        for file in ctx.changed_files {
            if ctx.is_test_file(&file.path) {
                impacts.add(
                    &file.path,
                    ImpactReason::new(
                        ReasonKind::DirectChange,
                        format!("test file was {}", file.change_type),
                        None,
                    ),
                );
            }
        }

        let sources: Vec<&str> = ctx
            .changed_files
            .iter()
            .filter(|f| !ctx.is_test_file(&f.path))
            .map(|f| f.path.as_str())
            .collect();

        // Deleted sources included: matching only looks at path strings.
        for &source in &sources {
            for test in match_test_files(source, ctx.all_files, patterns) {
                impacts.add(
                    &test,
                    ImpactReason::new(
                        ReasonKind::NamingConvention,
                        format!("matches naming convention for {source}"),
                        Some(source),
                    ),
                );
            }
        }

        let changed_paths = ctx.changed_paths();
        if let Some(&first) = changed_paths.first() {
            let changed: HashSet<&str> = changed_paths.iter().copied().collect();
            let reached = affected_files(
                &changed_paths,
                ctx.graph,
                ctx.config.effective_max_depth(),
            );
            for (file, depth) in &reached {
                if *depth == 0 || !ctx.is_test_file(file) {
                    continue;
                }
                let related = nearest_changed(ctx.graph, file, &changed, first);
                let description = if *depth == 1 {
                    format!("directly imports {related}")
                } else {
                    format!("transitively imports {related} (depth {depth})")
                };
                impacts.add(
                    file,
                    ImpactReason::new(ReasonKind::ImportsChanged, description, Some(related)),
                );
            }
        }

        // Tests directly inside a test folder next to the changed source.
        for &source in &sources {
            let dir = source.rsplit_once('/').map_or("", |(dir, _)| dir);
            for sub in COLOCATED_TEST_DIRS {
                let prefix = if dir.is_empty() {
                    format!("{sub}/")
                } else {
                    format!("{dir}/{sub}/")
                };
                for test in ctx.all_files {
                    let direct_child = test
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| !rest.contains('/'));
                    if direct_child
                        && ctx.is_test_file(test)
                        && !impacts.contains(test)
                    {
                        impacts.add(
                            test,
                            ImpactReason::new(
                                ReasonKind::FolderConvention,
                                format!("lives in the test folder next to {source}"),
                                Some(source),
                            ),
                        );
                    }
                }
            }
        }

        ctx.logger.debug(&format!(
            "{}: {} impacted tests",
            self.name(),
            impacts.len()
        ));
        impacts.into_sorted()
    }
}
