//! Field path patterns.
//!
//! `prefix.*` with no other wildcard matches `prefix` itself and anything
//! below it. Any other pattern containing `*` or `?` is a shell-style glob
//! over the full path (`*` matches any run including dots, `?` one
//! character). Everything else is an exact match.
//!
//! The bare `prefix` match exists because a subtree that appears or
//! disappears as a whole is reported as one Added/Removed record at the
//! subtree's own path (`appearance`, not `appearance.eyes`).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPattern {
    Exact(String),
    Prefix(String),
    Glob(Vec<char>),
}

impl FieldPattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(prefix) = pattern.strip_suffix(".*") {
            if !prefix.contains(['*', '?']) {
                return FieldPattern::Prefix(prefix.to_string());
            }
        }
        if pattern.contains(['*', '?']) {
            FieldPattern::Glob(pattern.chars().collect())
        } else {
            FieldPattern::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            FieldPattern::Exact(p) => p == path,
            FieldPattern::Prefix(prefix) => {
                path == prefix
                    || (path.len() > prefix.len()
                        && path.starts_with(prefix.as_str())
                        && path.as_bytes()[prefix.len()] == b'.')
            }
            FieldPattern::Glob(pattern) => {
                let text: Vec<char> = path.chars().collect();
                glob_match(pattern, &text)
            }
        }
    }
}

/// Iterative wildcard match with single-star backtracking.
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
