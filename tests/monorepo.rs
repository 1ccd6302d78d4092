mod common;

use std::path::Path;

use testsift::analyzers::ReasonKind;
use testsift::change;
use testsift::config::Config;
use testsift::logger::NullLogger;
use testsift::monorepo::{
    MonorepoKind, affected_packages, detect_monorepo, package_for_file, resolve_package_import,
};
use testsift::pipeline::{self, RunOptions};
use testsift::walker::{BuildOptions, build_dependency_graph};

#[test]
fn detects_npm_workspaces() {
    let p = common::MonorepoProject::new();
    let info = detect_monorepo(&p.root, &NullLogger);
    assert!(info.is_monorepo);
    assert_eq!(info.kind, MonorepoKind::Npm);
    let names: Vec<&str> = info.workspaces.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names.len(), 3);
    for name in ["@app/ui", "@app/utils", "@app/web"] {
        assert!(names.contains(&name), "missing {name}");
    }

    let ui = info.workspace("@app/ui").unwrap();
    assert!(ui.internal_dependencies.contains("@app/utils"));
    assert!(ui.depended_by.contains("@app/web"));
    // react is external
    let web = info.workspace("@app/web").unwrap();
    assert_eq!(web.internal_dependencies.len(), 1);
}

#[test]
fn exports_map_resolution() {
    let p = common::MonorepoProject::new();
    let info = detect_monorepo(&p.root, &NullLogger);
    let ui = p.root.join("packages/ui/src");
    assert_eq!(resolve_package_import("@app/ui", &info), Some(ui.join("index.ts")));
    assert_eq!(resolve_package_import("@app/ui/button", &info), Some(ui.join("button.tsx")));
    assert_eq!(resolve_package_import("@app/ui/card", &info), Some(ui.join("card.tsx")));
    assert_eq!(resolve_package_import("@app/ui/invalid", &info), None);
    assert_eq!(
        resolve_package_import("@app/utils", &info),
        Some(p.root.join("packages/utils/src/index.ts"))
    );
    assert_eq!(resolve_package_import("react", &info), None);
}

#[test]
fn files_map_to_owning_package() {
    let p = common::MonorepoProject::new();
    let info = detect_monorepo(&p.root, &NullLogger);
    let owner = package_for_file(Path::new("apps/web/src/page.tsx"), &info).unwrap();
    assert_eq!(owner.name, "@app/web");
    assert!(package_for_file(Path::new("package.json"), &info).is_none());
}

#[test]
fn dependents_are_affected() {
    let p = common::MonorepoProject::new();
    let info = detect_monorepo(&p.root, &NullLogger);
    let affected: Vec<String> = affected_packages(&["@app/utils"], &info).into_iter().collect();
    assert_eq!(affected, vec!["@app/ui", "@app/utils", "@app/web"]);
    let leaf: Vec<String> = affected_packages(&["@app/web"], &info).into_iter().collect();
    assert_eq!(leaf, vec!["@app/web"]);
}

#[test]
fn graph_crosses_package_boundaries() {
    let p = common::MonorepoProject::new();
    let info = detect_monorepo(&p.root, &NullLogger);
    let result = build_dependency_graph(
        &p.root,
        &BuildOptions {
            no_cache: true,
            monorepo: Some(&info),
            ..BuildOptions::default()
        },
        &NullLogger,
    );
    let page: Vec<&str> = result.graph.imports_of("apps/web/src/page.tsx").collect();
    assert!(page.contains(&"packages/ui/src/index.ts"));
    assert!(page.contains(&"packages/ui/src/card.tsx"));
    let button: Vec<&str> = result.graph.imports_of("packages/ui/src/button.tsx").collect();
    assert_eq!(button, vec!["packages/utils/src/index.ts"]);
    assert!(result.graph.is_symmetric());
}

#[test]
fn leaf_package_change_reaches_app_test() {
    let p = common::MonorepoProject::new();
    let report = pipeline::run(
        &p.root,
        &change::from_paths(&["packages/utils/src/index.ts"]),
        &Config::default(),
        RunOptions { no_cache: true },
        &NullLogger,
    )
    .unwrap();
    assert_eq!(report.affected_packages, vec!["@app/ui", "@app/utils", "@app/web"]);
    let test = &report.impacted_tests[0];
    assert_eq!(test.path, "apps/web/src/page.test.tsx");
    assert!(test.has_reason(ReasonKind::ImportsChanged));
    assert!(test.reasons[0].description.contains("depth 4"));

    let mono = report.monorepo.as_ref().unwrap();
    assert_eq!(mono.kind, MonorepoKind::Npm);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["monorepo"]["type"], "npm");
}
