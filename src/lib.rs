#![warn(clippy::pedantic)]
// Binary crate with internal library; all callers are us.
// These doc lints are for public API documentation, not applicable here.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzers;
pub mod cache;
pub mod change;
pub mod config;
pub mod error;
pub mod git;
pub mod glob;
pub mod graph;
pub mod heuristics;
pub mod lang;
pub mod logger;
pub mod monorepo;
pub mod pipeline;
pub mod report;
pub mod walker;
