//! # Core Session Module
//!
//! - [`resolve`]: pure role resolution
//! - [`NavigationGuard`]: redirect state machine
//! - [`SessionCore`]: the state container tying both to the collaborators
//! - [`RoleExistenceFlags`] / [`SwitchOffer`]: advisory dual-profile labels

mod existence;
mod guard;
mod resolver;
mod session;

pub use existence::{OfferAction, RoleExistenceFlags, SwitchOffer};
pub use guard::{
    decide, GuardDecision, GuardState, GuardTransition, GuardView, LoopReport, NavigationGuard,
};
pub use resolver::{resolve, Resolution, RoleSource, SessionPhase};
pub use session::SessionCore;
