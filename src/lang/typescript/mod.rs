pub mod parser;
pub mod resolver;

use crate::lang::SourceExtractor;

pub const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    ".turbo",
    ".cache",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptSupport;

impl TypeScriptSupport {
    pub fn new() -> Self {
        Self
    }
}

impl SourceExtractor for TypeScriptSupport {
    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn skip_dirs(&self) -> &[&str] {
        SKIP_DIRS
    }

    fn extract_imports(&self, source: &str) -> Vec<String> {
        parser::parse_imports(source)
    }

    fn extract_exports(&self, source: &str) -> Vec<String> {
        parser::parse_exports(source)
    }
}
