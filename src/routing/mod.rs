//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request + candidate peers (from upstream realm routing)
//!     → store.rs (snapshot of the published repository)
//!     → evaluator.rs (per-candidate score)
//!         → repository.rs (targets for peer identity / realm)
//!         → matcher.rs (rule match against message attributes)
//!     → Return: candidates with scores, input order
//!     → ranking.rs (optional caller policy: sort, floor, best)
//!
//! Rule compilation (startup and reload):
//!     Directive[]
//!     → builder.rs (compile patterns, reject bad definitions)
//!     → Freeze as immutable Repository
//!     → store.rs (atomic swap)
//! ```
//!
//! # Design Decisions
//! - Repositories are immutable; reload replaces them whole
//! - Scores are additive; every matching rule contributes
//! - Routing never fails; it only annotates the candidates it was given

pub mod builder;
pub mod evaluator;
pub mod matcher;
pub mod message;
pub mod ranking;
pub mod repository;
pub mod rules;
pub mod store;

pub use builder::{build, ConfigError, Directive, MatchLiteral, RepositoryBuilder, TargetKey};
pub use evaluator::{evaluate, Candidate};
pub use matcher::MatchSpec;
pub use message::{AttributeError, AttributeMap, Message, Peer, PeerInfo};
pub use ranking::{best, rank, RankPolicy};
pub use repository::Repository;
pub use rules::{Criteria, Rule, Target, TargetClass};
pub use store::{RuleStore, StoreState};
