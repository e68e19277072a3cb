//! Logger-name patterns over the dot hierarchy
//!
//! Rust targets use `::` as the separator; they are normalized to `.` so that
//! `my_app::db` and `my_app.db` name the same logger.
//!
//! Pattern forms:
//! - `*` matches every logger
//! - `a.b.*` matches strict descendants of `a.b` (`a.b.c`, `a.b.c.d`), not `a.b` and not `a.bx`
//! - `a.b` matches exactly `a.b`

use std::fmt;
use std::str::FromStr;

use crate::errors::{CaptureError, Result};

/// Normalize a facade target into a dotted logger name
pub fn logger_name_from_target(target: &str) -> String {
    target.replace("::", ".")
}

/// One parsed logger-name pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamePattern {
    Any,
    Exact(String),
    Descendants(String),
}

impl NamePattern {
    /// Parse and validate a pattern
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty patterns, empty segments,
    /// whitespace, or a `*` anywhere other than a whole trailing segment.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(CaptureError::configuration("logger pattern is empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CaptureError::configuration(format!(
                "logger pattern '{}' contains whitespace",
                raw
            )));
        }

        let normalized = logger_name_from_target(raw);
        if normalized == "*" {
            return Ok(NamePattern::Any);
        }

        let (base, descendants) = match normalized.strip_suffix(".*") {
            Some(base) => (base, true),
            None => (normalized.as_str(), false),
        };

        for segment in base.split('.') {
            if segment.is_empty() {
                return Err(CaptureError::configuration(format!(
                    "logger pattern '{}' has an empty segment",
                    raw
                )));
            }
            if segment.contains('*') {
                return Err(CaptureError::configuration(format!(
                    "logger pattern '{}' may only use '*' as a whole trailing segment",
                    raw
                )));
            }
        }

        let base = base.to_string();
        Ok(if descendants {
            NamePattern::Descendants(base)
        } else {
            NamePattern::Exact(base)
        })
    }

    /// Check a normalized logger name against this pattern
    pub fn matches(&self, logger_name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(name) => logger_name == name,
            NamePattern::Descendants(prefix) => {
                logger_name.len() > prefix.len() + 1
                    && logger_name.starts_with(prefix.as_str())
                    && logger_name.as_bytes()[prefix.len()] == b'.'
            }
        }
    }
}

impl FromStr for NamePattern {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self> {
        NamePattern::parse(s)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Any => write!(f, "*"),
            NamePattern::Exact(name) => write!(f, "{}", name),
            NamePattern::Descendants(prefix) => write!(f, "{}.*", prefix),
        }
    }
}

/// A non-empty, ordered set of patterns; a name matches if any pattern does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<NamePattern>,
}

impl PatternSet {
    /// Parse every pattern; duplicates are dropped, order kept
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the set is empty or any pattern is invalid.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<NamePattern> = Vec::new();
        for item in raw {
            let pattern = NamePattern::parse(item.as_ref())?;
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        Self::new(patterns)
    }

    /// Build from already-parsed patterns
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `patterns` is empty.
    pub fn new(patterns: Vec<NamePattern>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(CaptureError::configuration(
                "at least one logger pattern is required",
            ));
        }
        Ok(Self { patterns })
    }

    pub fn matches(&self, logger_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(logger_name))
    }

    pub fn patterns(&self) -> &[NamePattern] {
        &self.patterns
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.patterns.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_pattern_excludes_parent_and_siblings() {
        let pattern = NamePattern::parse("a.b.*").unwrap();
        assert!(pattern.matches("a.b.c"));
        assert!(pattern.matches("a.b.c.d"));
        assert!(!pattern.matches("a.b"));
        assert!(!pattern.matches("a.bx"));
        assert!(!pattern.matches("a.bc"));
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = NamePattern::parse("a.b").unwrap();
        assert!(pattern.matches("a.b"));
        assert!(!pattern.matches("a.b.c"));
        assert!(!pattern.matches("a"));
    }

    #[test]
    fn test_any_pattern() {
        let pattern = NamePattern::parse("*").unwrap();
        assert!(pattern.matches("anything.at.all"));
        assert!(pattern.matches(""));
    }

    #[test]
    fn test_rust_separators_are_normalized() {
        let pattern = NamePattern::parse("my_app::db::*").unwrap();
        assert_eq!(pattern, NamePattern::Descendants("my_app.db".to_string()));
        assert!(pattern.matches(&logger_name_from_target("my_app::db::pool")));
    }

    #[test]
    fn test_invalid_patterns_are_configuration_errors() {
        for raw in ["", "a..b", ".a", "a.", "a.*.b", "a*", "*.a", "a b", "a.b.**"] {
            let err = NamePattern::parse(raw).unwrap_err();
            assert_eq!(err.code(), "ERR_CONFIGURATION", "pattern {:?}", raw);
        }
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["*", "a.b", "a.b.*"] {
            assert_eq!(NamePattern::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_pattern_set_rejects_empty() {
        let err = PatternSet::parse(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.code(), "ERR_CONFIGURATION");
    }

    #[test]
    fn test_pattern_set_matches_any_member_and_dedups() {
        let set = PatternSet::parse(["app.*", "db", "app.*"]).unwrap();
        assert_eq!(set.patterns().len(), 2);
        assert!(set.matches("app.start"));
        assert!(set.matches("db"));
        assert!(!set.matches("db.pool"));
        assert_eq!(set.to_string(), "[app.*, db]");
    }
}
