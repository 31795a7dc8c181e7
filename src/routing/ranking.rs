//! Selection policies layered on top of raw scores.

use crate::config::schema::RankingConfig;
use crate::routing::evaluator::Candidate;

/// Sort highest score first. Equal scores keep their input order.
pub fn rank<P>(mut scored: Vec<Candidate<'_, P>>) -> Vec<Candidate<'_, P>> {
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// The preferred candidate; the earliest one wins a tie.
pub fn best<'a, 'p, P>(scored: &'a [Candidate<'p, P>]) -> Option<&'a Candidate<'p, P>> {
    scored.iter().fold(None, |best: Option<&Candidate<'p, P>>, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    })
}

/// Ranking plus an optional score floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankPolicy {
    /// Candidates scoring below this are dropped.
    pub min_score: Option<i64>,
}

impl RankPolicy {
    pub fn apply<'p, P>(&self, scored: Vec<Candidate<'p, P>>) -> Vec<Candidate<'p, P>> {
        let kept = match self.min_score {
            Some(floor) => scored.into_iter().filter(|c| c.score >= floor).collect(),
            None => scored,
        };
        rank(kept)
    }
}

impl From<&RankingConfig> for RankPolicy {
    fn from(config: &RankingConfig) -> Self {
        Self {
            min_score: config.min_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::message::PeerInfo;

    fn scored<'a>(peers: &'a [PeerInfo], scores: &[i64]) -> Vec<Candidate<'a, PeerInfo>> {
        peers
            .iter()
            .zip(scores)
            .map(|(peer, &score)| Candidate { peer, score })
            .collect()
    }

    fn names<'a>(scored: &[Candidate<'a, PeerInfo>]) -> Vec<&'a str> {
        scored.iter().map(|c| c.peer.identity.as_str()).collect()
    }

    #[test]
    fn test_rank_is_stable() {
        let peers = [PeerInfo::new("a"), PeerInfo::new("b"), PeerInfo::new("c"), PeerInfo::new("d")];
        let ranked = rank(scored(&peers, &[5, 10, 5, -1]));
        assert_eq!(names(&ranked), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_best_prefers_first_on_tie() {
        let peers = [PeerInfo::new("a"), PeerInfo::new("b"), PeerInfo::new("c")];
        let s = scored(&peers, &[3, 7, 7]);
        assert_eq!(best(&s).unwrap().peer.identity, "b");
        assert!(best::<PeerInfo>(&[]).is_none());
    }

    #[test]
    fn test_policy_floor() {
        let peers = [PeerInfo::new("a"), PeerInfo::new("b"), PeerInfo::new("c")];
        let policy = RankPolicy { min_score: Some(0) };
        let kept = policy.apply(scored(&peers, &[-70, 0, 15]));
        assert_eq!(names(&kept), vec!["c", "b"]);

        let all = RankPolicy::default().apply(scored(&peers, &[-70, 0, 15]));
        assert_eq!(all.len(), 3);
    }
}
