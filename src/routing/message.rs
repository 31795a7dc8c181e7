//! Contracts for the message and peer handles the evaluator reads.
//!
//! Wire decoding and peer management live outside this crate; routing only
//! needs string views of a few attributes.

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

use crate::routing::rules::Criteria;

/// Failure reading an attribute from a message.
#[derive(Debug, Clone, Error)]
#[error("cannot read {criteria} attribute: {reason}")]
pub struct AttributeError {
    pub criteria: Criteria,
    pub reason: String,
}

/// Read access to the attributes rules are matched against.
pub trait Message {
    /// Returns the value for `criteria`, or `None` when the message does
    /// not carry it. Never called with [`Criteria::All`].
    fn attribute(&self, criteria: Criteria) -> Result<Option<Cow<'_, str>>, AttributeError>;
}

/// A next-hop candidate.
pub trait Peer {
    /// Diameter identity of the peer.
    fn identity(&self) -> &str;

    /// Realm the peer advertised, if known.
    fn realm(&self) -> Option<&str> {
        None
    }
}

/// Message backed by a plain attribute map.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    values: HashMap<Criteria, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, criteria: Criteria, value: impl Into<String>) -> Self {
        self.insert(criteria, value);
        self
    }

    pub fn insert(&mut self, criteria: Criteria, value: impl Into<String>) {
        self.values.insert(criteria, value.into());
    }
}

impl Message for AttributeMap {
    fn attribute(&self, criteria: Criteria) -> Result<Option<Cow<'_, str>>, AttributeError> {
        Ok(self.values.get(&criteria).map(|v| Cow::Borrowed(v.as_str())))
    }
}

/// Owned peer description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub identity: String,
    pub realm: Option<String>,
}

impl PeerInfo {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            realm: None,
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }
}

impl Peer for PeerInfo {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }
}

impl<P: Peer + ?Sized> Peer for &P {
    fn identity(&self) -> &str {
        (**self).identity()
    }

    fn realm(&self) -> Option<&str> {
        (**self).realm()
    }
}
