//! Git integration: changed files against a base ref.

use std::path::Path;
use std::process::Command;

use crate::change::{ChangedFile, parse_name_status};
use crate::error::Error;

fn git(args: &[&str], dir: &Path) -> Result<std::process::Output, Error> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitError(format!("failed to run git: {e}")))
}

/// Check whether the given path is inside a git repository.
pub fn is_git_repo(path: &Path) -> bool {
    git(&["rev-parse", "--git-dir"], path).is_ok_and(|o| o.status.success())
}

/// Files changed between `base` and the working tree, relative to `root`.
///
/// Runs `git diff --name-status --relative <base>` inside `root`, so a
/// project living in a subdirectory of the repository sees its own paths.
pub fn changed_files(root: &Path, base: &str) -> Result<Vec<ChangedFile>, Error> {
    if !is_git_repo(root) {
        return Err(Error::NotAGitRepo);
    }
    let output = git(&["diff", "--name-status", "--relative", base], root)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitError(format!(
            "git diff against '{base}' failed: {}",
            stderr.trim()
        )));
    }
    Ok(parse_name_status(&String::from_utf8_lossy(&output.stdout)))
}
