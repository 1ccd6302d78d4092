use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

// Each pattern captures the module specifier in group 1. `[^'"();]` lets
// named import lists span lines without running past a statement.
static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+(?:type\s+)?[^'"();]*?\bfrom\s*['"]([^'"\n]+)['"]"#).unwrap()
});
static IMPORT_SIDE_EFFECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\s*['"]([^'"\n]+)['"]"#).unwrap());
static IMPORT_DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\s*\(\s*['"`]([^'"`\n]+)['"`]\s*\)"#).unwrap());
static REQUIRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\brequire\s*\(\s*['"`]([^'"`\n]+)['"`]\s*\)"#).unwrap());
static EXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"]([^'"\n]+)['"]"#,
    )
    .unwrap()
});

static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bexport\s+(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:const|let|var|function\s*\*?|class|interface|type|enum|namespace)\s+([A-Za-z_$][\w$]*)",
    )
    .unwrap()
});
static EXPORT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+(?:type\s+)?\{([^}]*)\}").unwrap());
static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\b").unwrap());

/// Every module specifier referenced by the source, in first-seen order.
pub fn parse_imports(source: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for re in [
        &*IMPORT_FROM,
        &*IMPORT_SIDE_EFFECT,
        &*IMPORT_DYNAMIC,
        &*REQUIRE,
        &*EXPORT_FROM,
    ] {
        for caps in re.captures_iter(source) {
            let spec = caps[1].trim();
            // Template literals with interpolation cannot be resolved statically.
            if spec.is_empty() || spec.contains("${") {
                continue;
            }
            if seen.insert(spec.to_string()) {
                out.push(spec.to_string());
            }
        }
    }
    out
}

/// Exported symbol names, sorted. Best effort: renamed default re-exports
/// and computed names are missed.
pub fn parse_exports(source: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    for caps in EXPORT_DECL.captures_iter(source) {
        names.insert(caps[1].to_string());
    }
    for caps in EXPORT_LIST.captures_iter(source) {
        for item in caps[1].split(',') {
            let item = item.trim();
            let item = item.strip_prefix("type ").unwrap_or(item).trim();
            if item.is_empty() {
                continue;
            }
            // `a as b` exports `b`
            let exported = item.rsplit(" as ").next().unwrap_or(item).trim();
            if !exported.is_empty() {
                names.insert(exported.to_string());
            }
        }
    }
    if EXPORT_DEFAULT.is_match(source) {
        names.insert("default".to_string());
    }
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_named_import() {
        assert_eq!(parse_imports(r#"import { foo } from "bar";"#), vec!["bar"]);
    }

    #[test]
    fn static_default_and_namespace_import() {
        let src = "import foo from './a';\nimport * as ns from '../b';";
        assert_eq!(parse_imports(src), vec!["./a", "../b"]);
    }

    #[test]
    fn type_only_import() {
        assert_eq!(parse_imports(r#"import type { Foo } from "./types";"#), vec!["./types"]);
    }

    #[test]
    fn multiline_named_import() {
        let src = "import {\n  a,\n  b,\n} from './many';\n";
        assert_eq!(parse_imports(src), vec!["./many"]);
    }

    #[test]
    fn side_effect_import() {
        assert_eq!(parse_imports("import './polyfill';"), vec!["./polyfill"]);
    }

    #[test]
    fn dynamic_import() {
        assert_eq!(parse_imports("const m = await import('./lazy');"), vec!["./lazy"]);
    }

    #[test]
    fn dynamic_template_with_interpolation_is_skipped() {
        assert!(parse_imports("import(`./locale/${lang}`)").is_empty());
    }

    #[test]
    fn require_call() {
        assert_eq!(parse_imports(r#"const x = require("./cjs");"#), vec!["./cjs"]);
    }

    #[test]
    fn reexports() {
        let src = "export * from './a';\nexport { b } from './b';\nexport * as c from './c';";
        assert_eq!(parse_imports(src), vec!["./a", "./b", "./c"]);
    }

    #[test]
    fn duplicates_collapse() {
        let src = "import a from './a';\nconst again = require('./a');";
        assert_eq!(parse_imports(src), vec!["./a"]);
    }

    #[test]
    fn named_exports() {
        let src = "export const a = 1;\nexport function b() {}\nexport class C {}\nexport interface D {}\nexport type E = string;\nexport enum F {}\nexport async function g() {}";
        assert_eq!(parse_exports(src), vec!["C", "D", "E", "F", "a", "b", "g"]);
    }

    #[test]
    fn export_list_uses_alias() {
        let src = "const x = 1; const y = 2;\nexport { x, y as why, type Z };";
        assert_eq!(parse_exports(src), vec!["Z", "why", "x"]);
    }

    #[test]
    fn default_export() {
        assert_eq!(parse_exports("export default function () {}"), vec!["default"]);
    }

    #[test]
    fn no_exports() {
        assert!(parse_exports("const internal = 1;").is_empty());
    }
}
