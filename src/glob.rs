//! Minimal glob matching for config filters and test patterns.
//!
//! Supported syntax: `*` (within one segment), `**` (any number of
//! segments), `?` (one non-separator character) and `{a,b}` alternation.
//! Everything else matches literally. Paths are compared with forward slashes.

use regex::Regex;

/// Translate a glob into an anchored regex. `None` if the translation is
/// not a valid regex (e.g. an unbalanced `}`), which callers treat as
/// "matches nothing".
pub fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let pattern = pattern.replace('\\', "/");
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');
    let mut group_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                if chars.get(i + 1) == Some(&'/') {
                    // `**/` also matches zero directories
                    re.push_str("(?:.*/)?");
                    i += 1;
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '{' => {
                group_depth += 1;
                re.push_str("(?:");
            }
            '}' if group_depth > 0 => {
                group_depth -= 1;
                re.push(')');
            }
            ',' if group_depth > 0 => re.push('|'),
            c => {
                let mut buf = [0u8; 4];
                re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
        i += 1;
    }
    re.push('$');
    Regex::new(&re).ok()
}

pub fn matches_glob(path: &str, pattern: &str) -> bool {
    let path = path.replace('\\', "/");
    glob_to_regex(pattern).is_some_and(|re| re.is_match(&path))
}

pub fn matches_any(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| matches_glob(path, p))
}

/// A pre-compiled pattern list, for matching many paths against the same
/// globs (source discovery, test detection over a whole tree).
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    regexes: Vec<Regex>,
}

impl GlobList {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            regexes: patterns.iter().filter_map(|p| glob_to_regex(p)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        let path = path.replace('\\', "/");
        self.regexes.iter().any(|re| re.is_match(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_stays_within_segment() {
        assert!(matches_glob("src/a.ts", "src/*.ts"));
        assert!(!matches_glob("src/deep/a.ts", "src/*.ts"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(matches_glob("src/deep/er/a.spec.ts", "**/*.spec.ts"));
        assert!(matches_glob("a.spec.ts", "**/*.spec.ts"));
        assert!(matches_glob("dist/x/y.js", "dist/**"));
        assert!(!matches_glob("src/dist.ts", "dist/**"));
    }

    #[test]
    fn braces_alternate() {
        assert!(matches_glob("src/a.test.tsx", "**/*.test.{ts,tsx}"));
        assert!(matches_glob("src/a.test.ts", "**/*.test.{ts,tsx}"));
        assert!(!matches_glob("src/a.test.js", "**/*.test.{ts,tsx}"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches_glob("a+b(1).ts", "a+b(1).ts"));
        assert!(!matches_glob("aab1.ts", "a+b(1).ts"));
        assert!(!matches_glob("srcXa.ts", "src.a.ts"));
    }

    #[test]
    fn question_mark_is_single_char() {
        assert!(matches_glob("v1.ts", "v?.ts"));
        assert!(!matches_glob("v10.ts", "v?.ts"));
    }

    #[test]
    fn windows_separators_are_normalized() {
        assert!(matches_glob("src\\auth\\login.ts", "src/**/*.ts"));
    }

    #[test]
    fn glob_list_matches_any_pattern() {
        let list = GlobList::new(&["**/*.gen.ts".to_string(), "vendor/**".to_string()]);
        assert!(list.is_match("src/api.gen.ts"));
        assert!(list.is_match("vendor/lib/x.js"));
        assert!(!list.is_match("src/api.ts"));
        assert!(GlobList::new(&[]).is_empty());
    }
}
