//! # Workflows
//!
//! Multi-step operations over a shared `Arc<RwLock<SessionCore>>`.
//!
//! Every workflow follows the same shape:
//! - read what it needs from the core under a short read lock
//! - call collaborators with no lock held
//! - write results back under a short write lock
//! - return domain types; presentation happens in the host

pub mod existence;
pub mod session;
pub mod switch;

pub use existence::{probe_role_existence, switch_offer};
pub use session::{apply_snapshot, location_changed};
pub use switch::{switch_to, SwitchOutcome};
