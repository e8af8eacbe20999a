//! Regex filtering for consumed messages
//!
//! This module compiles the comma-separated filter flags into a
//! [`FilterSpec`] and decides whether a message attribute (a Kafka key or
//! a CloudEvent `type`) should be emitted.

use crate::error::FilterError;
use regex::Regex;

/// Ordered set of compiled filter patterns.
///
/// Patterns use substring search semantics: a candidate matches a pattern
/// if the pattern is found anywhere in it. An empty spec means filtering is
/// disabled and every candidate is emitted.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    patterns: Vec<Regex>,
}

impl FilterSpec {
    /// Compile a comma-separated list of regex patterns.
    ///
    /// Empty segments are skipped, so an empty flag or a trailing comma is
    /// accepted. Compilation stops at the first invalid pattern.
    ///
    /// # Arguments
    ///
    /// * `patterns` - Comma-separated regex list, possibly empty
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPattern` naming the first pattern that
    /// fails to compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use kafka_tail::filter::FilterSpec;
    ///
    /// let spec = FilterSpec::compile(r"^order\.,user\.created,").unwrap();
    /// assert_eq!(spec.len(), 2);
    /// assert!(spec.should_emit("order.created"));
    /// assert!(!spec.should_emit("user.updated"));
    /// ```
    pub fn compile(patterns: &str) -> Result<Self, FilterError> {
        let mut compiled = Vec::new();

        for pattern in patterns.split(',') {
            if pattern.is_empty() {
                continue;
            }

            let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            compiled.push(regex);
        }

        Ok(Self { patterns: compiled })
    }

    /// Returns true if at least one pattern was compiled.
    ///
    /// Filtering is active exactly when the spec is non-empty.
    pub fn is_active(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern was compiled.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Decide whether a candidate should be emitted.
    ///
    /// Always true when filtering is inactive; otherwise true iff any
    /// pattern matches somewhere in `candidate`.
    pub fn should_emit(&self, candidate: &str) -> bool {
        should_emit(candidate, self, self.is_active())
    }

    /// The source text of every compiled pattern, in order.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }

    /// Human-readable summary for logging.
    pub fn summary(&self) -> String {
        if self.patterns.is_empty() {
            "no filters (all messages)".to_string()
        } else {
            self.patterns().join(",")
        }
    }
}

/// Evaluate `candidate` against `spec`.
///
/// When `active` is false every candidate passes. When `active` is true the
/// candidate passes iff some pattern matches; an empty spec therefore
/// suppresses everything, a state [`FilterSpec::should_emit`] never reaches
/// because it derives `active` from the spec itself.
pub fn should_emit(candidate: &str, spec: &FilterSpec, active: bool) -> bool {
    if !active {
        return true;
    }

    spec.patterns.iter().any(|regex| regex.is_match(candidate))
}
