//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build rules → Publish → Start reload triggers
//!
//! Reload (startup.rs::Reloader):
//!     file change / SIGHUP / request_reload()
//!     → one reload at a time → RuleStore::reload_with
//!
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM → broadcast → reload loop and listeners exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::ReloadRequest;
pub use startup::{load_initial, Reloader};
