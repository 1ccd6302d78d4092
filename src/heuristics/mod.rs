//! Deterministic rules relating files to tests and to risk.
//!
//! Each matcher is a set of free functions over project-relative paths or
//! source text. None of them touch the file system.

pub mod folder;
pub mod naming;
pub mod route;
