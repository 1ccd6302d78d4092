use std::fs;

use rayon::prelude::*;

use super::{AnalysisContext, Analyzer, ImpactMap, ImpactReason, ImpactedFile, ReasonKind};
use crate::heuristics::route::{
    Route, SIMILARITY_THRESHOLD, extract_requests, extract_routes, route_similarity,
};

/// API tests that exercise routes declared in changed files.
///
/// Routes come from the changed sources; requests come from every test
/// file. An exact pattern match is a hit; otherwise a same-method request
/// scoring at least [`SIMILARITY_THRESHOLD`] is reported as a near match.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteTestAnalyzer;

impl RouteTestAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

fn describe(route: &Route, request: &Route) -> Option<String> {
    if route.matches(request) {
        return Some(format!("calls {request}, handled by {route}"));
    }
    let same_method = route.method == "ALL" || route.method == request.method;
    let score = route_similarity(&route.path, &request.path);
    (same_method && score >= SIMILARITY_THRESHOLD)
        .then(|| format!("calls {request}, similar to {route} ({score:.2})"))
}

impl Analyzer for RouteTestAnalyzer {
    type Output = Vec<ImpactedFile>;

    fn name(&self) -> &'static str {
        "route"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<ImpactedFile> {
        let mut declared: Vec<(&str, Vec<Route>)> = Vec::new();
        for file in ctx.changed_files {
            if file.is_deleted() || ctx.is_test_file(&file.path) {
                continue;
            }
            let Ok(source) = fs::read_to_string(ctx.project_root.join(&file.path)) else {
                continue;
            };
            let routes = extract_routes(&source);
            if !routes.is_empty() {
                declared.push((file.path.as_str(), routes));
            }
        }
        if declared.is_empty() {
            return Vec::new();
        }

        let requests: Vec<(&String, Vec<Route>)> = ctx
            .all_files
            .par_iter()
            .filter(|f| ctx.is_test_file(f))
            .filter_map(|f| {
                let source = fs::read_to_string(ctx.project_root.join(f)).ok()?;
                let requests = extract_requests(&source);
                (!requests.is_empty()).then_some((f, requests))
            })
            .collect();

        let mut impacts = ImpactMap::new();
        for (test, calls) in &requests {
            for (source, routes) in &declared {
                let hit = calls
                    .iter()
                    .flat_map(|call| routes.iter().map(move |route| (route, call)))
                    .find_map(|(route, call)| describe(route, call));
                if let Some(description) = hit {
                    impacts.add(
                        test,
                        ImpactReason::new(ReasonKind::RouteMatch, description, Some(*source)),
                    );
                }
            }
        }

        ctx.logger.debug(&format!(
            "{}: {} routes changed, {} impacted tests",
            self.name(),
            declared.iter().map(|(_, r)| r.len()).sum::<usize>(),
            impacts.len()
        ));
        impacts.into_sorted()
    }
}
