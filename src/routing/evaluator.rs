//! Candidate scoring.
//!
//! # Responsibilities
//! - Derive lookup keys from each candidate (identity, realm)
//! - Collect the rules of every matching target
//! - Sum the score deltas of the rules that apply to the message
//!
//! # Design Decisions
//! - Scores start at 0 and are plain sums (no clamping, no normalization)
//! - All matching targets contribute, pattern and exact alike
//! - Output keeps candidate order; ranking is left to the caller
//! - Each message attribute is read at most once per evaluation
//! - An unreadable attribute makes its rules contribute nothing

use std::borrow::Cow;
use std::fmt;

use crate::observability::metrics;
use crate::routing::message::{Message, Peer};
use crate::routing::repository::Repository;
use crate::routing::rules::{Criteria, Rule, TargetClass};

/// A candidate annotated with its accumulated score.
pub struct Candidate<'p, P> {
    pub peer: &'p P,
    pub score: i64,
}

impl<P> Clone for Candidate<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Candidate<'_, P> {}

impl<P: fmt::Debug> fmt::Debug for Candidate<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("peer", self.peer)
            .field("score", &self.score)
            .finish()
    }
}

/// Lazily filled view of the message attributes.
struct Attributes<'m, M: ?Sized> {
    message: &'m M,
    cache: [Option<Option<Cow<'m, str>>>; Criteria::COUNT],
}

impl<'m, M: Message + ?Sized> Attributes<'m, M> {
    fn new(message: &'m M) -> Self {
        Self {
            message,
            cache: Default::default(),
        }
    }

    fn get(&mut self, criteria: Criteria) -> Option<&str> {
        let message = self.message;
        self.cache[criteria.index()]
            .get_or_insert_with(|| match message.attribute(criteria) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(criteria = %criteria, error = %e, "Attribute unreadable, rules on it score 0");
                    None
                }
            })
            .as_deref()
    }
}

fn rule_applies<M: Message + ?Sized>(rule: &Rule, attrs: &mut Attributes<'_, M>) -> bool {
    match &rule.spec {
        None => true,
        Some(spec) => attrs
            .get(rule.criteria)
            .is_some_and(|value| spec.matches(value)),
    }
}

fn score_peer<M, P>(repo: &Repository, attrs: &mut Attributes<'_, M>, peer: &P) -> i64
where
    M: Message + ?Sized,
    P: Peer,
{
    let mut score = 0i64;
    for target in repo.find_targets(TargetClass::PeerIdentity, peer.identity()) {
        score += target
            .rules
            .iter()
            .filter(|r| rule_applies(r, attrs))
            .map(|r| i64::from(r.score))
            .sum::<i64>();
    }

    let realm = match peer.realm() {
        Some(realm) => Some(realm.to_string()),
        None => attrs.get(Criteria::DestinationRealm).map(str::to_string),
    };
    if let Some(realm) = realm {
        for target in repo.find_targets(TargetClass::Realm, &realm) {
            score += target
                .rules
                .iter()
                .filter(|r| rule_applies(r, attrs))
                .map(|r| i64::from(r.score))
                .sum::<i64>();
        }
    }
    score
}

/// Score every candidate against `repo`.
///
/// Returns one entry per candidate, in input order.
pub fn evaluate<'p, M, P>(repo: &Repository, message: &M, candidates: &'p [P]) -> Vec<Candidate<'p, P>>
where
    M: Message + ?Sized,
    P: Peer,
{
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut attrs = Attributes::new(message);
    let scored: Vec<_> = candidates
        .iter()
        .map(|peer| {
            let score = score_peer(repo, &mut attrs, peer);
            tracing::trace!(peer = %peer.identity(), score, "Candidate scored");
            Candidate { peer, score }
        })
        .collect();

    metrics::record_evaluation(scored.len());
    scored
}
