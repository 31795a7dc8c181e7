//! Match predicate for configured strings.
//!
//! # Responsibilities
//! - Hold one configured match value (exact literal or regular expression)
//! - Evaluate it against one runtime string
//!
//! # Design Decisions
//! - Exact matching is ASCII case-insensitive (Diameter identities and realms)
//! - Patterns are compiled once, when the rule set is built
//! - Pattern anchoring is left to the pattern itself (`^`/`$`)
//! - The literal is always retained for dumps

use std::fmt;

use regex::Regex;

/// A configured match value.
///
/// The only way to obtain a pattern spec is [`MatchSpec::pattern`], so every
/// pattern held by a published rule set has compiled successfully.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    literal: String,
    /// Lowercased literal, used for ordering and lookup of exact values.
    folded: String,
    compiled: Option<Regex>,
}

impl MatchSpec {
    /// Create an exact (case-insensitive) match.
    pub fn exact(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        Self {
            folded: literal.to_ascii_lowercase(),
            literal,
            compiled: None,
        }
    }

    /// Compile a regular expression match.
    pub fn pattern(literal: impl Into<String>) -> Result<Self, regex::Error> {
        let literal = literal.into();
        let compiled = Regex::new(&literal)?;
        Ok(Self {
            folded: literal.to_ascii_lowercase(),
            literal,
            compiled: Some(compiled),
        })
    }

    /// Build either kind from its configured form.
    pub fn new(literal: impl Into<String>, is_pattern: bool) -> Result<Self, regex::Error> {
        if is_pattern {
            Self::pattern(literal)
        } else {
            Ok(Self::exact(literal))
        }
    }

    /// The configured text, exactly as written.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_pattern(&self) -> bool {
        self.compiled.is_some()
    }

    pub(crate) fn folded(&self) -> &str {
        &self.folded
    }

    /// Returns true if `value` satisfies this spec.
    pub fn matches(&self, value: &str) -> bool {
        match &self.compiled {
            Some(re) => re.is_match(value),
            None => value.eq_ignore_ascii_case(&self.literal),
        }
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pattern() {
            write!(f, "[\"{}\"]", self.literal)
        } else {
            write!(f, "\"{}\"", self.literal)
        }
    }
}

/// Compares `folded` (already lowercase) with `key` lowercased on the fly.
pub(crate) fn cmp_folded(folded: &str, key: &str) -> std::cmp::Ordering {
    folded
        .bytes()
        .cmp(key.bytes().map(|b| b.to_ascii_lowercase()))
}
