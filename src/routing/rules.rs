//! Targets, rules and the vocabulary they are written in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::routing::matcher::MatchSpec;

/// Well-known score values of the default router.
pub mod score {
    pub const NO_DELIVERY: i32 = -70;
    pub const DEFAULT: i32 = 5;
    pub const DEFAULT_REALM: i32 = 10;
    pub const REALM: i32 = 15;
    pub const REDIR_HOST: i32 = 25;
    pub const REDIR_APP: i32 = 30;
    pub const REDIR_REALM: i32 = 35;
    pub const REDIR_REALM_APP: i32 = 40;
    pub const REDIR_USER: i32 = 45;
    pub const REDIR_SESSION: i32 = 50;
    pub const FINALDEST: i32 = 100;

    /// Resolve a named score, with an optional leading `-` or `+`.
    pub fn named(name: &str) -> Option<i32> {
        let name = name.trim();
        let (sign, name) = match name.strip_prefix('-') {
            Some(rest) => (-1, rest.trim_start()),
            None => (1, name.strip_prefix('+').unwrap_or(name).trim_start()),
        };
        let value = match name.to_ascii_uppercase().as_str() {
            "NO_DELIVERY" => NO_DELIVERY,
            "DEFAULT" => DEFAULT,
            "DEFAULT_REALM" => DEFAULT_REALM,
            "REALM" => REALM,
            "REDIR_HOST" => REDIR_HOST,
            "REDIR_APP" => REDIR_APP,
            "REDIR_REALM" => REDIR_REALM,
            "REDIR_REALM_APP" => REDIR_REALM_APP,
            "REDIR_USER" => REDIR_USER,
            "REDIR_SESSION" => REDIR_SESSION,
            "FINALDEST" => FINALDEST,
            _ => return None,
        };
        Some(sign * value)
    }
}

/// Which candidate property a target is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetClass {
    /// The peer's Diameter identity.
    #[serde(rename = "peer", alias = "peer_identity")]
    PeerIdentity,
    /// The peer's realm.
    #[serde(rename = "realm")]
    Realm,
}

impl TargetClass {
    pub const ALL: [TargetClass; 2] = [TargetClass::PeerIdentity, TargetClass::Realm];

    pub(crate) fn index(self) -> usize {
        match self {
            TargetClass::PeerIdentity => 0,
            TargetClass::Realm => 1,
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetClass::PeerIdentity => f.write_str("peer"),
            TargetClass::Realm => f.write_str("realm"),
        }
    }
}

/// The message attribute a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criteria {
    /// Always applies; carries no match.
    All,
    OriginHost,
    OriginRealm,
    DestinationHost,
    DestinationRealm,
    UserName,
    SessionId,
    Application,
}

impl Criteria {
    pub const COUNT: usize = 8;

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criteria::All => "all",
            Criteria::OriginHost => "origin_host",
            Criteria::OriginRealm => "origin_realm",
            Criteria::DestinationHost => "destination_host",
            Criteria::DestinationRealm => "destination_realm",
            Criteria::UserName => "user_name",
            Criteria::SessionId => "session_id",
            Criteria::Application => "application",
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a criteria name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown criteria type '{0}'")]
pub struct UnknownCriteria(pub String);

impl FromStr for Criteria {
    type Err = UnknownCriteria;

    /// Accepts the canonical names, dashed spellings and the short
    /// forms (`*`, `oh`, `or`, `dh`, `dr`, `un`, `si`, `app`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "_");
        let criteria = match name.as_str() {
            "all" | "*" => Criteria::All,
            "origin_host" | "oh" => Criteria::OriginHost,
            "origin_realm" | "or" => Criteria::OriginRealm,
            "destination_host" | "dh" => Criteria::DestinationHost,
            "destination_realm" | "dr" => Criteria::DestinationRealm,
            "user_name" | "un" => Criteria::UserName,
            "session_id" | "si" => Criteria::SessionId,
            "application" | "app" => Criteria::Application,
            _ => return Err(UnknownCriteria(s.to_string())),
        };
        Ok(criteria)
    }
}

/// One scoring rule under a target.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) criteria: Criteria,
    /// `None` exactly when `criteria` is [`Criteria::All`].
    pub(crate) spec: Option<MatchSpec>,
    pub(crate) score: i32,
}

impl Rule {
    pub fn criteria(&self) -> Criteria {
        self.criteria
    }

    pub fn spec(&self) -> Option<&MatchSpec> {
        self.spec.as_ref()
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// Ordering used to keep dumps deterministic.
    pub(crate) fn sort_key(&self) -> (Criteria, bool, &str) {
        match &self.spec {
            Some(spec) => (self.criteria, spec.is_pattern(), spec.literal()),
            None => (self.criteria, false, ""),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            Some(spec) => write!(f, "{}={} += {}", self.criteria, spec, self.score),
            None => write!(f, "* += {}", self.score),
        }
    }
}

/// A selector value (peer identity or realm) grouping rules.
#[derive(Debug, Clone)]
pub struct Target {
    pub(crate) spec: MatchSpec,
    pub(crate) rules: Vec<Rule>,
}

impl Target {
    pub fn spec(&self) -> &MatchSpec {
        &self.spec
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_names() {
        assert_eq!("all".parse::<Criteria>().unwrap(), Criteria::All);
        assert_eq!("*".parse::<Criteria>().unwrap(), Criteria::All);
        assert_eq!("Origin-Realm".parse::<Criteria>().unwrap(), Criteria::OriginRealm);
        assert_eq!("app".parse::<Criteria>().unwrap(), Criteria::Application);
        assert_eq!("si".parse::<Criteria>().unwrap(), Criteria::SessionId);
        assert!("priority".parse::<Criteria>().is_err());

        for c in [Criteria::All, Criteria::UserName, Criteria::DestinationHost] {
            assert_eq!(c.as_str().parse::<Criteria>().unwrap(), c);
        }
    }

    #[test]
    fn test_criteria_index_is_dense() {
        assert_eq!(Criteria::All.index(), 0);
        assert_eq!(Criteria::Application.index(), Criteria::COUNT - 1);
    }

    #[test]
    fn test_named_scores() {
        assert_eq!(score::named("REALM"), Some(15));
        assert_eq!(score::named("-realm"), Some(-15));
        assert_eq!(score::named("+FINALDEST"), Some(100));
        assert_eq!(score::named("NO_DELIVERY"), Some(-70));
        assert_eq!(score::named("HIGH"), None);
    }
}
