//! External matchers.
//!
//! An [`ExternalMatcher`] decides whether a resolved module belongs to an
//! external package whose name should be recorded. Matchers are combined into
//! an [`ExternalTest`], which is evaluated once per module resolution event.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

/// Signature of a predicate matcher: `(relative_path, importer) -> is_external`.
pub type PredicateFn = dyn Fn(&str, Option<&str>) -> anyhow::Result<bool> + Send + Sync;

/// A single external-module matcher.
#[derive(Clone)]
pub enum ExternalMatcher {
    /// Matches on exact equality or as a path-segment prefix:
    /// `foo` matches `foo` and `foo/bar` but not `foobar`.
    Prefix(String),
    /// Matches when the regular expression finds a match in the path.
    Pattern(Regex),
    /// Arbitrary predicate over the relative path and the importing module.
    Predicate(Arc<PredicateFn>),
}

impl ExternalMatcher {
    /// Create a prefix matcher.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Compile a regular expression matcher.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Wrap a predicate. A returned error aborts the build.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Evaluate this matcher against a build-root relative path.
    pub fn matches(&self, path: &str, importer: Option<&str>) -> Result<bool> {
        match self {
            Self::Prefix(prefix) => Ok(matches_prefix(prefix, path)),
            Self::Pattern(regex) => Ok(regex.is_match(path)),
            Self::Predicate(predicate) => {
                predicate(path, importer).map_err(|e| Error::Matcher {
                    path: path.to_string(),
                    message: format!("{e:#}"),
                })
            }
        }
    }
}

impl fmt::Debug for ExternalMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for ExternalMatcher {
    fn from(prefix: &str) -> Self {
        Self::Prefix(prefix.to_string())
    }
}

impl From<String> for ExternalMatcher {
    fn from(prefix: String) -> Self {
        Self::Prefix(prefix)
    }
}

impl From<Regex> for ExternalMatcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

fn matches_prefix(prefix: &str, path: &str) -> bool {
    if path.len() < prefix.len() {
        return false;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// The combined external test built from zero or more matchers.
///
/// With no matchers the test never reports a module as external, which
/// disables dependency collection for the build.
#[derive(Debug, Clone, Default)]
pub struct ExternalTest {
    matchers: Vec<ExternalMatcher>,
}

impl ExternalTest {
    pub fn new(matchers: impl IntoIterator<Item = ExternalMatcher>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }

    /// Whether any matcher is configured.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn matchers(&self) -> &[ExternalMatcher] {
        &self.matchers
    }

    /// Returns true as soon as one matcher accepts the path.
    ///
    /// Matchers are evaluated in configuration order; a predicate error stops
    /// evaluation and is returned.
    pub fn is_external(&self, path: &str, importer: Option<&str>) -> Result<bool> {
        for matcher in &self.matchers {
            if matcher.matches(path, importer)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_segment_semantics() {
        let m = ExternalMatcher::prefix("foo");
        assert!(m.matches("foo", None).unwrap());
        assert!(m.matches("foo/bar", None).unwrap());
        assert!(!m.matches("foobar", None).unwrap());
        assert!(!m.matches("fo", None).unwrap());
    }

    #[test]
    fn test_scoped_prefix() {
        let m = ExternalMatcher::from("@scope/pkg");
        assert!(m.matches("@scope/pkg/sub", None).unwrap());
        assert!(!m.matches("@scope/pkg-extra", None).unwrap());
    }

    #[test]
    fn test_pattern() {
        let m = ExternalMatcher::pattern("^react").unwrap();
        assert!(m.matches("react/jsx-runtime", None).unwrap());
        assert!(m.matches("react-dom/client", None).unwrap());
        assert!(!m.matches("./local/util", None).unwrap());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExternalMatcher::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_predicate_sees_importer() {
        let m = ExternalMatcher::predicate(|path, importer| {
            Ok(path.starts_with("lodash") && importer == Some("src/app.ts"))
        });
        assert!(m.matches("lodash/fp", Some("src/app.ts")).unwrap());
        assert!(!m.matches("lodash/fp", Some("src/other.ts")).unwrap());
    }

    #[test]
    fn test_predicate_error_propagates() {
        let m = ExternalMatcher::predicate(|_, _| anyhow::bail!("misconfigured"));
        let err = m.matches("react", None).unwrap_err();
        assert!(err.to_string().contains("misconfigured"));
    }

    #[test]
    fn test_predicate_overrides_non_matching_prefix() {
        let test = ExternalTest::new([
            ExternalMatcher::prefix("vue"),
            ExternalMatcher::predicate(|path, _| Ok(path == "preact")),
        ]);
        assert!(test.is_external("preact", None).unwrap());
        assert!(!test.is_external("solid-js", None).unwrap());
    }

    #[test]
    fn test_empty_test_never_external() {
        let test = ExternalTest::default();
        assert!(test.is_empty());
        assert!(!test.is_external("react", None).unwrap());
        assert!(!test.is_external("@scope/pkg", Some("src/index.ts")).unwrap());
    }

    #[test]
    fn test_first_match_short_circuits() {
        let test = ExternalTest::new([
            ExternalMatcher::prefix("react"),
            ExternalMatcher::predicate(|_, _| anyhow::bail!("must not be reached")),
        ]);
        assert!(test.is_external("react", None).unwrap());
    }
}
