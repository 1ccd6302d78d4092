//! Changed-file input: `git diff --name-status` output or plain path lists.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Project-relative path, forward slashes.
    pub path: String,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

impl ChangedFile {
    pub fn new(path: &str, change_type: ChangeType) -> Self {
        Self {
            path: normalize_path(path),
            change_type,
            old_path: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.change_type == ChangeType::Deleted
    }
}

/// Forward slashes, no leading `./`.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Parse `git diff --name-status` output.
///
/// Status letters `A`, `M`, `D`, `R<score>` and `C<score>` are understood
/// (copies count as additions, type changes as modifications). Lines with
/// no tab are taken as bare modified paths, so a plain file list works too.
/// Blank lines and `#` comments are skipped.
pub fn parse_name_status(text: &str) -> Vec<ChangedFile> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let file = match fields.as_slice() {
            [path] => ChangedFile::new(path, ChangeType::Modified),
            [status, path] => {
                let change_type = match status.chars().next() {
                    Some('A' | 'C') => ChangeType::Added,
                    Some('D') => ChangeType::Deleted,
                    Some('R') => ChangeType::Renamed,
                    _ => ChangeType::Modified,
                };
                ChangedFile::new(path, change_type)
            }
            [status, old, new, ..] => {
                let mut file = if status.starts_with('C') {
                    ChangedFile::new(new, ChangeType::Added)
                } else {
                    ChangedFile::new(new, ChangeType::Renamed)
                };
                file.old_path = Some(normalize_path(old));
                file
            }
            [] => continue,
        };
        if !file.path.is_empty() {
            out.push(file);
        }
    }
    out
}

/// Treat every path as modified.
pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Vec<ChangedFile> {
    paths
        .iter()
        .map(|p| ChangedFile::new(p.as_ref(), ChangeType::Modified))
        .filter(|f| !f.path.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_status_lines() {
        let text = "M\tsrc/a.ts\nA\tsrc/b.ts\nD\tsrc/c.ts\nR100\tsrc/old.ts\tsrc/new.ts\nC75\tsrc/x.ts\tsrc/y.ts\nT\tsrc/t.ts\n";
        let files = parse_name_status(text);
        assert_eq!(files.len(), 6);
        assert_eq!(files[0], ChangedFile::new("src/a.ts", ChangeType::Modified));
        assert_eq!(files[1].change_type, ChangeType::Added);
        assert!(files[2].is_deleted());
        assert_eq!(files[3].path, "src/new.ts");
        assert_eq!(files[3].old_path.as_deref(), Some("src/old.ts"));
        assert_eq!(files[3].change_type, ChangeType::Renamed);
        assert_eq!(files[4].change_type, ChangeType::Added);
        assert_eq!(files[5].change_type, ChangeType::Modified);
    }

    #[test]
    fn plain_list_and_comments() {
        let files = parse_name_status("# changed\n./src/a.ts\n\n  \nsrc\\win\\b.ts\n");
        assert_eq!(
            files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            vec!["src/a.ts", "src/win/b.ts"]
        );
    }

    #[test]
    fn from_paths_skips_blank() {
        let files = from_paths(&["a.ts", " ", "./b.ts"]);
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].path, "b.ts");
    }
}
