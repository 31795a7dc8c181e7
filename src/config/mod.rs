//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, lowering to directives)
//!     → routing::builder (compile into a Repository)
//!     → routing::store (publish)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change, waits for the file to settle
//!     → loader.rs loads new config
//!     → validation.rs + builder
//!     → atomic swap in routing::store
//!     → failure: log, keep the current rules
//! ```
//!
//! # Design Decisions
//! - Rule sets are immutable once built; changes require full reload
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::LoadError;
pub use schema::{RankingConfig, RouterConfig, RuleConfig, ScoreValue, TargetConfig};
