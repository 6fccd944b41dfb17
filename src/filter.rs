//! `PathFilter` algebra (spec §4.1).
//!
//! Every filter is a pure predicate over a forward-slash-separated
//! relative path. `Multiple` is the workhorse: rules are scanned in
//! append order, the first match decides, and an unmatched path falls
//! back to the builder's default.

use std::fmt;

#[derive(Clone)]
pub enum PathFilter {
    AcceptAll,
    RejectAll,
    Literal(String),
    Glob(GlobPattern),
    All(Vec<PathFilter>),
    Multiple {
        rules: Vec<(PathFilter, bool)>,
        default_accept: bool,
    },
}

impl PathFilter {
    pub fn accept_all() -> Self {
        PathFilter::AcceptAll
    }

    pub fn reject_all() -> Self {
        PathFilter::RejectAll
    }

    pub fn literal(path: impl Into<String>) -> Self {
        PathFilter::Literal(path.into())
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        PathFilter::Glob(GlobPattern::compile(pattern.into()))
    }

    pub fn all(filters: impl IntoIterator<Item = PathFilter>) -> Self {
        PathFilter::All(filters.into_iter().collect())
    }

    /// Builds a literal or glob filter depending on whether `pattern`
    /// contains a `*`, matching how descriptor `<include>`/`<exclude>`
    /// rules are authored (spec §6).
    pub fn path(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.contains('*') {
            PathFilter::glob(pattern)
        } else {
            PathFilter::literal(pattern)
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathFilter::AcceptAll => true,
            PathFilter::RejectAll => false,
            PathFilter::Literal(expected) => path == expected,
            PathFilter::Glob(glob) => glob.matches(path),
            PathFilter::All(filters) => filters.iter().all(|f| f.matches(path)),
            PathFilter::Multiple {
                rules,
                default_accept,
            } => {
                for (filter, include) in rules {
                    if filter.matches(path) {
                        return *include;
                    }
                }
                *default_accept
            }
        }
    }
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathFilter::AcceptAll => write!(f, "AcceptAll"),
            PathFilter::RejectAll => write!(f, "RejectAll"),
            PathFilter::Literal(p) => write!(f, "Literal({p:?})"),
            PathFilter::Glob(g) => write!(f, "Glob({:?})", g.source),
            PathFilter::All(fs) => write!(f, "All({fs:?})"),
            PathFilter::Multiple {
                rules,
                default_accept,
            } => f
                .debug_struct("Multiple")
                .field("rules", rules)
                .field("default_accept", default_accept)
                .finish(),
        }
    }
}

/// Builds a `Multiple` filter from an ordered sequence of include/exclude
/// rules, matching the descriptor grammar's `<imports>`/`<exports>`
/// element (spec §6), which always defaults to accept.
#[derive(Default)]
pub struct PathFilterBuilder {
    rules: Vec<(PathFilter, bool)>,
    default_accept: bool,
}

impl PathFilterBuilder {
    pub fn new(default_accept: bool) -> Self {
        Self {
            rules: Vec::new(),
            default_accept,
        }
    }

    pub fn include(mut self, filter: PathFilter) -> Self {
        self.rules.push((filter, true));
        self
    }

    pub fn exclude(mut self, filter: PathFilter) -> Self {
        self.rules.push((filter, false));
        self
    }

    pub fn include_path(self, pattern: impl Into<String>) -> Self {
        self.include(PathFilter::path(pattern))
    }

    pub fn exclude_path(self, pattern: impl Into<String>) -> Self {
        self.exclude(PathFilter::path(pattern))
    }

    pub fn build(self) -> PathFilter {
        PathFilter::Multiple {
            rules: self.rules,
            default_accept: self.default_accept,
        }
    }
}

/// A compiled glob where `*` matches exactly one path segment and `**`
/// matches zero or more full segments. Anchored at both ends.
#[derive(Clone)]
pub struct GlobPattern {
    source: String,
    segments: Vec<GlobSegment>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum GlobSegment {
    Literal(String),
    Star,
    DoubleStar,
}

impl GlobPattern {
    pub fn compile(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let segments = source
            .split('/')
            .map(|segment| match segment {
                "*" => GlobSegment::Star,
                "**" => GlobSegment::DoubleStar,
                other => GlobSegment::Literal(other.to_string()),
            })
            .collect();
        Self { source, segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').collect();
        glob_match(&self.segments, &path_segments)
    }
}

/// Bottom-up DP rather than naive recursion so a run of `**` segments
/// can't blow up the call stack on deep paths.
fn glob_match(pattern: &[GlobSegment], path: &[&str]) -> bool {
    let (p_len, s_len) = (pattern.len(), path.len());
    let mut dp = vec![vec![false; s_len + 1]; p_len + 1];
    dp[p_len][s_len] = true;

    for i in (0..=p_len).rev() {
        for j in (0..=s_len).rev() {
            if i == p_len {
                dp[i][j] = j == s_len;
                continue;
            }
            dp[i][j] = match &pattern[i] {
                GlobSegment::Literal(expected) => {
                    j < s_len && expected == path[j] && dp[i + 1][j + 1]
                }
                GlobSegment::Star => j < s_len && dp[i + 1][j + 1],
                GlobSegment::DoubleStar => dp[i + 1][j] || (j < s_len && dp[i][j + 1]),
            };
        }
    }

    dp[0][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exactly() {
        let f = PathFilter::literal("a/b/c");
        assert!(f.matches("a/b/c"));
        assert!(!f.matches("a/b/c/d"));
        assert!(!f.matches("a/b"));
    }

    #[test]
    fn star_matches_single_segment() {
        let f = PathFilter::glob("a/*/c");
        assert!(f.matches("a/b/c"));
        assert!(!f.matches("a/b/x/c"));
        assert!(!f.matches("a/c"));
    }

    #[test]
    fn double_star_matches_any_depth_including_zero() {
        let f = PathFilter::glob("org/jboss/**");
        assert!(f.matches("org/jboss"));
        assert!(f.matches("org/jboss/Foo"));
        assert!(f.matches("org/jboss/a/b/c/Foo"));
        assert!(!f.matches("com/acme/Bar"));
    }

    #[test]
    fn multiple_is_first_match_wins_with_default() {
        let filter = PathFilterBuilder::new(true)
            .exclude_path("nested")
            .exclude_path("org/jboss/**")
            .build();

        assert!(!filter.matches("nested"));
        assert!(!filter.matches("org/jboss/Foo"));
        assert!(filter.matches("com/acme/Bar"));
    }

    #[test]
    fn multiple_defaults_to_reject_when_configured() {
        let filter = PathFilterBuilder::new(false)
            .include_path("com/acme/**")
            .build();

        assert!(filter.matches("com/acme/Bar"));
        assert!(!filter.matches("org/jboss/Foo"));
    }

    #[test]
    fn accept_all_and_reject_all() {
        assert!(PathFilter::accept_all().matches("anything/at/all"));
        assert!(!PathFilter::reject_all().matches("anything/at/all"));
    }

    #[test]
    fn all_requires_every_constituent() {
        let f = PathFilter::all([PathFilter::glob("a/**"), PathFilter::literal("a/b")]);
        assert!(f.matches("a/b"));
        assert!(!f.matches("a/c"));
    }
}
