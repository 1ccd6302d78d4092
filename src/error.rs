//! Error types for the testsift CLI.

use std::path::PathBuf;

/// Errors surfaced to the caller. Everything else (unreadable sources,
/// unresolved imports, corrupt caches) is recovered locally and logged.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Project root does not exist.
    RootNotFound(PathBuf, std::io::Error),
    /// Project root is a file, not a directory.
    RootNotDirectory(PathBuf),
    /// Explicitly requested config file cannot be read.
    ConfigRead(PathBuf, std::io::Error),
    /// Config file contains invalid JSON or wrongly typed options.
    ConfigParse(PathBuf, serde_json::Error),
    /// Cannot read the list of changed files.
    ChangesRead(PathBuf, std::io::Error),
    /// No TypeScript/JavaScript sources were found under the root.
    NoSourceFiles(PathBuf),
    /// Cannot write the dependency cache.
    CacheWrite(PathBuf, std::io::Error),
    /// Not inside a git repository.
    NotAGitRepo,
    /// Git command failed.
    GitError(String),
    /// The analysis report cannot be rendered as JSON.
    ReportSerialize(serde_json::Error),
}

impl Error {
    /// User-facing hint to accompany the error message.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::NoSourceFiles(_) => Some(
                "testsift analyzes TypeScript/JavaScript (.ts, .tsx, .js, .jsx, .mjs, .cjs, .mts, .cts) files",
            ),
            Self::RootNotDirectory(_) => Some("--root must point at the project directory"),
            Self::ConfigParse(_, _) => {
                Some("see testsift.config.json options: ignorePatterns, testPatterns, riskWeights, maxDepth")
            }
            Self::NotAGitRepo => Some("pass changed files explicitly or use --changes <file>"),
            _ => None,
        }
    }
}

// Display: lowercase, no trailing punctuation, so it composes into
// larger error messages.
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootNotFound(path, source) => {
                write!(f, "cannot find project root '{}': {source}", path.display())
            }
            Self::RootNotDirectory(path) => {
                write!(f, "'{}' is not a directory", path.display())
            }
            Self::ConfigRead(path, source) => {
                write!(f, "cannot read config '{}': {source}", path.display())
            }
            Self::ConfigParse(path, source) => {
                write!(f, "invalid config '{}': {source}", path.display())
            }
            Self::ChangesRead(path, source) => {
                write!(f, "cannot read changed files from '{}': {source}", path.display())
            }
            Self::NoSourceFiles(path) => {
                write!(f, "no source files found under '{}'", path.display())
            }
            Self::CacheWrite(path, source) => {
                write!(f, "cannot write cache '{}': {source}", path.display())
            }
            Self::NotAGitRepo => write!(f, "not inside a git repository"),
            Self::GitError(msg) => write!(f, "git: {msg}"),
            Self::ReportSerialize(source) => write!(f, "cannot serialize report: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RootNotFound(_, e)
            | Self::ConfigRead(_, e)
            | Self::ChangesRead(_, e)
            | Self::CacheWrite(_, e) => Some(e),
            Self::ConfigParse(_, e) | Self::ReportSerialize(e) => Some(e),
            _ => None,
        }
    }
}
