//! Shared helpers for integration tests.

use std::io::Write;

use diameter_rtd::routing::{Directive, MatchLiteral, TargetClass, TargetKey};
use tempfile::NamedTempFile;

pub fn target(class: TargetClass, literal: &str, pattern: bool) -> TargetKey {
    TargetKey::new(class, literal, pattern)
}

/// `AddTarget` for `key` followed by one `AddRule` per `(criteria, match, score)`.
pub fn target_with_rules(key: &TargetKey, rules: &[(&str, Option<(&str, bool)>, i64)]) -> Vec<Directive> {
    let mut out = vec![Directive::AddTarget(key.clone())];
    for (criteria, matcher, score) in rules {
        out.push(Directive::AddRule {
            target: key.clone(),
            criteria: criteria.to_string(),
            matcher: matcher.map(|(literal, pattern)| MatchLiteral {
                literal: literal.to_string(),
                pattern,
            }),
            score: *score,
        });
    }
    out
}

/// Write `content` to a fresh temporary file.
#[allow(dead_code)]
pub fn rules_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
