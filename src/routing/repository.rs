//! Rule repository lookup.
//!
//! # Responsibilities
//! - Store targets per class, split into pattern and exact groups
//! - Find every target matching a lookup key
//! - Describe itself for dumps and diagnostics
//!
//! # Design Decisions
//! - Immutable after construction (built by `builder.rs`, shared via `Arc`)
//! - Pattern targets keep configuration order and are scanned in full
//! - Exact targets are sorted by lowercased literal and binary-searched
//! - Exact literals are unique per class, so at most one exact hit

use std::fmt;

use serde::Serialize;

use crate::routing::builder::{Directive, MatchLiteral, TargetKey};
use crate::routing::matcher::cmp_folded;
use crate::routing::rules::{Criteria, Target, TargetClass};

#[derive(Debug, Default, Clone)]
pub(crate) struct TargetGroup {
    pub(crate) patterns: Vec<Target>,
    /// Sorted ascending by folded literal.
    pub(crate) exact: Vec<Target>,
}

impl TargetGroup {
    fn find_exact(&self, key: &str) -> Option<&Target> {
        self.exact
            .binary_search_by(|t| cmp_folded(t.spec.folded(), key))
            .ok()
            .map(|i| &self.exact[i])
    }

    fn iter(&self) -> impl Iterator<Item = &Target> {
        self.patterns.iter().chain(self.exact.iter())
    }
}

/// The complete, immutable rule set.
#[derive(Debug, Default, Clone)]
pub struct Repository {
    groups: [TargetGroup; 2],
}

impl Repository {
    pub(crate) fn from_groups(peers: TargetGroup, realms: TargetGroup) -> Self {
        Self {
            groups: [peers, realms],
        }
    }

    fn group(&self, class: TargetClass) -> &TargetGroup {
        &self.groups[class.index()]
    }

    /// Every target of `class` matching `key`: pattern targets first, in
    /// configuration order, then the exact target if there is one.
    pub fn find_targets<'a>(
        &'a self,
        class: TargetClass,
        key: &'a str,
    ) -> impl Iterator<Item = &'a Target> + 'a {
        let group = self.group(class);
        group
            .patterns
            .iter()
            .filter(move |t| t.spec.matches(key))
            .chain(group.find_exact(key))
    }

    /// All targets of a class, patterns first.
    pub fn targets(&self, class: TargetClass) -> impl Iterator<Item = &Target> {
        self.group(class).iter()
    }

    pub fn target_count(&self) -> usize {
        self.groups.iter().map(|g| g.patterns.len() + g.exact.len()).sum()
    }

    pub fn rule_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.iter())
            .map(|t| t.rules.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.target_count() == 0
    }

    /// Serializable description of the whole repository.
    pub fn dump(&self) -> Vec<TargetDump> {
        TargetClass::ALL
            .into_iter()
            .flat_map(|class| {
                self.targets(class).map(move |t| TargetDump {
                    class,
                    literal: t.spec.literal().to_string(),
                    pattern: t.spec.is_pattern(),
                    rules: t
                        .rules
                        .iter()
                        .map(|r| RuleDump {
                            criteria: r.criteria,
                            literal: r.spec.as_ref().map(|s| s.literal().to_string()),
                            pattern: r.spec.as_ref().is_some_and(|s| s.is_pattern()),
                            score: r.score,
                        })
                        .collect(),
                })
            })
            .collect()
    }

    /// The directive sequence that rebuilds an equivalent repository.
    pub fn to_directives(&self) -> Vec<Directive> {
        let mut out = Vec::new();
        for target in self.dump() {
            let key = TargetKey {
                class: target.class,
                literal: target.literal,
                pattern: target.pattern,
            };
            out.push(Directive::AddTarget(key.clone()));
            for rule in target.rules {
                out.push(Directive::AddRule {
                    target: key.clone(),
                    criteria: rule.criteria.as_str().to_string(),
                    matcher: rule.literal.map(|literal| MatchLiteral {
                        literal,
                        pattern: rule.pattern,
                    }),
                    score: i64::from(rule.score),
                });
            }
        }
        out
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in TargetClass::ALL {
            for target in self.targets(class) {
                writeln!(f, "{} {}", class, target.spec)?;
                for rule in &target.rules {
                    writeln!(f, "    {}", rule)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDump {
    pub class: TargetClass,
    #[serde(rename = "match")]
    pub literal: String,
    pub pattern: bool,
    pub rules: Vec<RuleDump>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDump {
    pub criteria: Criteria,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    pub pattern: bool,
    pub score: i32,
}
