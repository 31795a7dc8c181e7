//! Score-based next-hop selection for Diameter-style request routing.
//!
//! Upstream routing hands over a request and the peers that can carry it;
//! this crate scores each peer against a hot-reloadable rule set.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use lifecycle::Shutdown;
pub use routing::{Candidate, Repository, RuleStore};
