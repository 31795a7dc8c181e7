//! Repository construction from parsed directives.
//!
//! # Responsibilities
//! - Turn a directive sequence into a fully formed [`Repository`]
//! - Compile every pattern and reject malformed definitions
//!
//! # Design Decisions
//! - All or nothing: the first error discards the whole build
//! - A build never touches the published repository; it produces a new one
//! - Exact targets are sorted once, at the end; rules are sorted for dumps

use std::collections::HashMap;

use thiserror::Error;

use crate::routing::matcher::MatchSpec;
use crate::routing::repository::{Repository, TargetGroup};
use crate::routing::rules::{Criteria, Rule, Target, TargetClass, UnknownCriteria};

/// Identifies a target in directives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub class: TargetClass,
    pub literal: String,
    pub pattern: bool,
}

impl TargetKey {
    pub fn new(class: TargetClass, literal: impl Into<String>, pattern: bool) -> Self {
        Self {
            class,
            literal: literal.into(),
            pattern,
        }
    }

    /// Name under which the builder indexes this target. Exact literals
    /// collide case-insensitively, patterns only when written identically.
    fn index_key(&self) -> (TargetClass, bool, String) {
        let literal = if self.pattern {
            self.literal.clone()
        } else {
            self.literal.to_ascii_lowercase()
        };
        (self.class, self.pattern, literal)
    }
}

/// Match value of a rule directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchLiteral {
    pub literal: String,
    pub pattern: bool,
}

/// One parsed configuration directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Directive {
    AddTarget(TargetKey),
    AddRule {
        target: TargetKey,
        criteria: String,
        matcher: Option<MatchLiteral>,
        score: i64,
    },
}

/// A rule definition the builder refuses.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownCriteria(#[from] UnknownCriteria),

    #[error("invalid pattern '{literal}': {source}")]
    InvalidPattern {
        literal: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate {class} target '{literal}'")]
    DuplicateTarget { class: TargetClass, literal: String },

    #[error("rule references undeclared {class} target '{literal}'")]
    UnknownTarget { class: TargetClass, literal: String },

    #[error("empty {class} target")]
    EmptyTarget { class: TargetClass },

    #[error("score {0} is outside the supported range")]
    ScoreOutOfRange(i64),

    #[error("criteria '{0}' requires a match value")]
    MissingMatch(Criteria),

    #[error("criteria 'all' does not take a match value")]
    UnexpectedMatch,
}

fn compile(literal: &str, pattern: bool) -> Result<MatchSpec, ConfigError> {
    MatchSpec::new(literal, pattern).map_err(|source| ConfigError::InvalidPattern {
        literal: literal.to_string(),
        source,
    })
}

/// Where a target lives while the build is in progress.
#[derive(Debug, Clone, Copy)]
struct Slot {
    class: TargetClass,
    pattern: bool,
    position: usize,
}

/// Incremental builder; consumed by [`RepositoryBuilder::finish`].
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    groups: [TargetGroup; 2],
    index: HashMap<(TargetClass, bool, String), Slot>,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one directive.
    pub fn apply(&mut self, directive: &Directive) -> Result<(), ConfigError> {
        match directive {
            Directive::AddTarget(key) => self.add_target(key),
            Directive::AddRule {
                target,
                criteria,
                matcher,
                score,
            } => self.add_rule(target, criteria, matcher.as_ref(), *score),
        }
    }

    fn add_target(&mut self, key: &TargetKey) -> Result<(), ConfigError> {
        if key.literal.is_empty() {
            return Err(ConfigError::EmptyTarget { class: key.class });
        }
        let index_key = key.index_key();
        if self.index.contains_key(&index_key) {
            return Err(ConfigError::DuplicateTarget {
                class: key.class,
                literal: key.literal.clone(),
            });
        }

        let target = Target {
            spec: compile(&key.literal, key.pattern)?,
            rules: Vec::new(),
        };
        let group = &mut self.groups[key.class.index()];
        let list = if key.pattern {
            &mut group.patterns
        } else {
            &mut group.exact
        };
        list.push(target);
        self.index.insert(
            index_key,
            Slot {
                class: key.class,
                pattern: key.pattern,
                position: list.len() - 1,
            },
        );
        Ok(())
    }

    fn add_rule(
        &mut self,
        target: &TargetKey,
        criteria: &str,
        matcher: Option<&MatchLiteral>,
        score: i64,
    ) -> Result<(), ConfigError> {
        let criteria: Criteria = criteria.parse()?;
        let score = i32::try_from(score).map_err(|_| ConfigError::ScoreOutOfRange(score))?;
        let spec = match (criteria, matcher) {
            (Criteria::All, None) => None,
            (Criteria::All, Some(_)) => return Err(ConfigError::UnexpectedMatch),
            (other, None) => return Err(ConfigError::MissingMatch(other)),
            (_, Some(m)) => Some(compile(&m.literal, m.pattern)?),
        };

        let slot = *self
            .index
            .get(&target.index_key())
            .ok_or_else(|| ConfigError::UnknownTarget {
                class: target.class,
                literal: target.literal.clone(),
            })?;
        let group = &mut self.groups[slot.class.index()];
        let list = if slot.pattern {
            &mut group.patterns
        } else {
            &mut group.exact
        };
        list[slot.position].rules.push(Rule {
            criteria,
            spec,
            score,
        });
        Ok(())
    }

    /// Seal the build into an immutable repository.
    pub fn finish(self) -> Repository {
        let [mut peers, mut realms] = self.groups;
        for group in [&mut peers, &mut realms] {
            group
                .exact
                .sort_by(|a, b| a.spec.folded().cmp(b.spec.folded()));
            for target in group.patterns.iter_mut().chain(group.exact.iter_mut()) {
                target.rules.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            }
        }
        Repository::from_groups(peers, realms)
    }
}

/// Build a repository from a complete directive set.
pub fn build<'a, I>(directives: I) -> Result<Repository, ConfigError>
where
    I: IntoIterator<Item = &'a Directive>,
{
    let mut builder = RepositoryBuilder::new();
    for directive in directives {
        builder.apply(directive)?;
    }
    Ok(builder.finish())
}
