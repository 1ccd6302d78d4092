//! HTTP route extraction and matching.
//!
//! Routes are pulled out of Express-style handlers (`router.get('/x', ...)`)
//! and NestJS decorators; request paths are pulled out of API tests
//! (`request(app).get('/x')`). Matching is segment-wise with `:param` and
//! `{param}` segments acting as wildcards.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Minimum [`route_similarity`] for a fuzzy association.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

static EXPRESS_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:app|router|server)\s*\.\s*(get|post|put|patch|delete|options|head|all)\s*\(\s*['"`]([^'"`]*)['"`]"#,
    )
    .unwrap()
});
static NEST_CONTROLLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@Controller\s*\(\s*(?:['"`]([^'"`]*)['"`])?[^)]*\)"#).unwrap()
});
static NEST_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(Get|Post|Put|Patch|Delete|Options|Head|All)\s*\(\s*(?:['"`]([^'"`]*)['"`])?\s*\)"#)
        .unwrap()
});
static REQUEST_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.\s*(get|post|put|patch|delete|options|head)\s*\(\s*['"`](/[^'"`]*)['"`]"#)
        .unwrap()
});
static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Route {
    /// Upper-case HTTP method, `ALL` for catch-all handlers.
    pub method: String,
    /// Normalized path.
    pub path: String,
}

impl Route {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: normalize_route(path),
        }
    }

    /// Same method (or a catch-all) and a matching path pattern.
    pub fn matches(&self, request: &Route) -> bool {
        (self.method == "ALL" || self.method == request.method)
            && route_matches(&self.path, &request.path)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Single leading slash, no trailing slash, no repeated slashes.
pub fn normalize_route(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_param(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('{')
}

/// Routes declared in `source`.
pub fn extract_routes(source: &str) -> Vec<Route> {
    let mut routes: Vec<Route> = EXPRESS_ROUTE
        .captures_iter(source)
        .map(|caps| Route::new(&caps[1], &caps[2]))
        .collect();

    let controllers: Vec<(usize, String)> = NEST_CONTROLLER
        .captures_iter(source)
        .map(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let base = caps.get(1).map_or("", |m| m.as_str()).to_string();
            (start, base)
        })
        .collect();
    for caps in NEST_METHOD.captures_iter(source) {
        let start = caps.get(0).map_or(0, |m| m.start());
        // the closest controller declared above the handler
        let base = controllers
            .iter()
            .rev()
            .find(|(pos, _)| *pos < start)
            .map_or("", |(_, base)| base.as_str());
        let path = caps.get(2).map_or("", |m| m.as_str());
        routes.push(Route::new(&caps[1], &format!("{base}/{path}")));
    }

    routes.sort();
    routes.dedup();
    routes
}

/// HTTP requests issued by a test (`.get('/users/1')`). Template
/// interpolations become `:param` segments.
pub fn extract_requests(source: &str) -> Vec<Route> {
    let mut requests: Vec<Route> = REQUEST_CALL
        .captures_iter(source)
        .map(|caps| {
            let path = INTERPOLATION.replace_all(&caps[2], ":param");
            let path = path.split(['?', '#']).next().unwrap_or_default();
            Route::new(&caps[1], path)
        })
        .collect();
    requests.sort();
    requests.dedup();
    requests
}

/// Whether `concrete` is an instance of `pattern`. Case-insensitive;
/// segment counts must agree; parameter segments in `pattern` match anything.
pub fn route_matches(pattern: &str, concrete: &str) -> bool {
    let a = segments(pattern);
    let b = segments(concrete);
    a.len() == b.len()
        && a.iter()
            .zip(&b)
            .all(|(x, y)| is_param(x) || x.eq_ignore_ascii_case(y))
}

/// 0.0..=1.0: per-segment credit over the longer segment count. Equal
/// segments score 1, a parameter against anything else 0.5.
#[allow(clippy::cast_precision_loss)]
pub fn route_similarity(a: &str, b: &str) -> f64 {
    let a = segments(a);
    let b = segments(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let credit: f64 = a
        .iter()
        .zip(&b)
        .map(|(x, y)| {
            if x.eq_ignore_ascii_case(y) {
                1.0
            } else if is_param(x) || is_param(y) {
                0.5
            } else {
                0.0
            }
        })
        .sum();
    credit / longest as f64
}
