//! # Hestia App - Role-Aware Session Core
//!
//! Decides which role a signed-in user acts as (homeowner or provider) and
//! keeps the visible screen group consistent with that role.
//!
//! ```text
//! SessionSnapshot ──► resolve() ──► SessionPhase ──► NavigationGuard ──► Navigator
//!                        ▲                                   │
//!                   RoleStore cache ◄──── corrections ───────┘
//! ```
//!
//! - [`crate::core::resolve`]: pure role resolution (profile > cache > homeowner)
//! - [`crate::core::NavigationGuard`]: redirect state machine with loop detection
//! - [`crate::core::SessionCore`]: state container fed by the host
//! - [`workflows`]: snapshot intake, role switching and dual-profile probing
//! - [`bridge`]: collaborator traits the host implements
//!
//! The crate performs no I/O of its own; storage, the session source, the
//! record probe and navigation are injected through [`bridge::SessionDeps`].

#![forbid(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod role_store;
pub mod workflows;

pub use bridge::{
    Navigator, RecordKind, RecordProbe, SessionBridge, SessionDeps, SessionSnapshot,
};
pub use config::{RouteTable, SessionConfig};
pub use crate::core::{
    GuardState, GuardView, LoopReport, NavigationGuard, RoleExistenceFlags, SessionCore,
    SessionPhase, SwitchOffer,
};
pub use errors::{Disposition, SessionError, ToastLevel};
pub use events::{EventBus, SessionEvent};
pub use role_store::{PendingWrite, RoleStore};
pub use workflows::{
    apply_snapshot, location_changed, probe_role_existence, switch_offer, switch_to,
    SwitchOutcome,
};

pub use hestia_core::{Identity, IdentityId, LocationGroup, Profile, Role, RoleClaim};
