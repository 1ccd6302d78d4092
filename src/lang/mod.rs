pub mod typescript;

/// Extracts import specifiers and export names from source text.
///
/// The shipped implementation is regex-based; an AST-backed extractor can
/// replace it without touching the graph builder.
pub trait SourceExtractor: Send + Sync {
    fn extensions(&self) -> &[&str];
    fn skip_dirs(&self) -> &[&str];
    fn extract_imports(&self, source: &str) -> Vec<String>;
    fn extract_exports(&self, source: &str) -> Vec<String>;
}
