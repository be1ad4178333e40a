//! # Navigation Guard
//!
//! Gates screen transitions on the resolved session phase.
//!
//! ```text
//!              Loading
//!   ┌──────────────┐    settled, location ok    ┌─────────────┐
//!   │ Initializing ├───────────────────────────►│ Passthrough │
//!   └──────┬───────┘                            └──────▲──────┘
//!          │ settled, wrong location                   │ arrived at target
//!          ▼                                           │
//!   ┌──────────────┐  redirect issued, waiting         │
//!   │   Blocking   ├───────────────────────────────────┘
//!   └──────────────┘
//! ```
//!
//! Only `Passthrough` renders children. A redirect is issued as a command on
//! the [`Navigator`], at most once per distinct `(phase, location)` input.
//!
//! A redirect stays pending until the navigator reports the target's group.
//! Needing another redirect while one is still pending, or exceeding the
//! per-resolution redirect budget, is a navigation loop. A signed-in session
//! reverts to the default role and gets one terminal redirect to its home; a
//! signed-out one gets one terminal redirect to the login route. Until the
//! session phase changes the guard sends no further commands and shows the
//! loading indicator wherever the location disagrees with the enforced phase.

use super::resolver::SessionPhase;
use crate::bridge::Navigator;
use crate::config::{RouteTable, DEFAULT_MAX_REDIRECTS};
use hestia_core::{LocationGroup, Role};
use tracing::{debug, info, warn};

/// What the host renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Neutral loading indicator only
    Loading,
    /// The routed screen
    Children,
}

/// Guard state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuardState {
    /// No settled phase yet
    #[default]
    Initializing,
    /// Waiting for the location to reach `target`
    Blocking {
        /// Route the location has to reach
        target: String,
    },
    /// Location agrees with the phase
    Passthrough,
}

impl GuardState {
    /// What to render in this state.
    #[must_use]
    pub fn view(&self) -> GuardView {
        match self {
            Self::Passthrough => GuardView::Children,
            Self::Initializing | Self::Blocking { .. } => GuardView::Loading,
        }
    }
}

/// Decision for one `(phase, location)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Phase not settled; keep showing the loading indicator
    Hold,
    /// Location is acceptable
    Stay,
    /// Navigate to the route
    Redirect(String),
}

/// Pure routing rule.
pub fn decide(phase: SessionPhase, location: LocationGroup, routes: &RouteTable) -> GuardDecision {
    let target = match phase {
        SessionPhase::Loading => return GuardDecision::Hold,
        SessionPhase::Unauthenticated => match location {
            LocationGroup::Auth => None,
            _ => Some(routes.login.as_str()),
        },
        SessionPhase::Resolved(role) => match (location, role) {
            (LocationGroup::Auth, role) => Some(routes.home(role)),
            (LocationGroup::Provider, Role::Homeowner) => Some(routes.home(Role::Homeowner)),
            (LocationGroup::Homeowner, Role::Provider) => Some(routes.home(Role::Provider)),
            _ => None,
        },
    };

    match target {
        Some(route) if LocationGroup::of_route(route) != location => {
            GuardDecision::Redirect(route.to_string())
        }
        _ => GuardDecision::Stay,
    }
}

/// Details of a detected navigation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Redirect that could not be completed
    pub failed_target: String,
    /// Terminal redirect target
    pub fallback: String,
    /// Phase the guard enforces until the session phase changes
    pub reverted: SessionPhase,
}

/// Result of feeding one input to the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardTransition {
    /// State after the input
    pub state: GuardState,
    /// Route sent to the navigator, if any
    pub redirected: Option<String>,
    /// Set when this input triggered loop handling
    pub loop_detected: Option<LoopReport>,
}

impl GuardTransition {
    fn quiet(state: GuardState) -> Self {
        Self {
            state,
            redirected: None,
            loop_detected: None,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingRedirect {
    target: String,
    group: LocationGroup,
}

/// Navigation guard state machine.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: RouteTable,
    max_redirects: u32,
    state: GuardState,
    last_input: Option<(SessionPhase, LocationGroup)>,
    resolution: Option<SessionPhase>,
    reverted_from: Option<SessionPhase>,
    pending: Option<PendingRedirect>,
    redirects_this_resolution: u32,
    frozen: bool,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(RouteTable::default(), DEFAULT_MAX_REDIRECTS)
    }
}

impl NavigationGuard {
    /// Create a guard in [`GuardState::Initializing`].
    pub fn new(routes: RouteTable, max_redirects: u32) -> Self {
        Self {
            routes,
            max_redirects: max_redirects.max(1),
            state: GuardState::Initializing,
            last_input: None,
            resolution: None,
            reverted_from: None,
            pending: None,
            redirects_this_resolution: 0,
            frozen: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// What to render now.
    pub fn view(&self) -> GuardView {
        self.state.view()
    }

    /// Whether loop handling has suspended redirects for this resolution.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Phase the last decision was made against.
    pub fn enforced_phase(&self) -> Option<SessionPhase> {
        self.resolution
    }

    /// Map a resolved phase to the one the guard enforces.
    ///
    /// After a loop the failed phase is replaced by the default role until
    /// the session produces a different phase.
    pub fn effective_phase(&self, phase: SessionPhase) -> SessionPhase {
        match (self.reverted_from, self.resolution) {
            (Some(from), Some(reverted)) if self.frozen && from == phase => reverted,
            _ => phase,
        }
    }

    /// Route table in use.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Forget everything tied to the current resolution, keeping the state.
    ///
    /// Used when the identity changes so no bookkeeping from the previous
    /// identity influences the next decision.
    pub fn invalidate(&mut self) {
        self.last_input = None;
        self.resolution = None;
        self.reverted_from = None;
        self.pending = None;
        self.redirects_this_resolution = 0;
        self.frozen = false;
    }

    /// Evaluate one input, issuing at most one navigation command.
    pub fn on_input(
        &mut self,
        phase: SessionPhase,
        location: LocationGroup,
        navigator: &dyn Navigator,
    ) -> GuardTransition {
        let phase = self.effective_phase(phase);
        if self.last_input == Some((phase, location)) {
            return GuardTransition::quiet(self.state.clone());
        }
        self.last_input = Some((phase, location));

        if self.resolution != Some(phase) {
            self.begin_resolution(phase);
        }

        let decision = decide(phase, location, &self.routes);
        debug!(%phase, %location, ?decision, frozen = self.frozen, "Guard evaluated");

        match decision {
            GuardDecision::Hold => {
                self.state = GuardState::Initializing;
                GuardTransition::quiet(self.state.clone())
            }
            GuardDecision::Stay => {
                if let Some(pending) = self.pending.take() {
                    debug!(target = %pending.target, %location, "Pending redirect settled");
                }
                self.state = GuardState::Passthrough;
                GuardTransition::quiet(self.state.clone())
            }
            GuardDecision::Redirect(target) if self.frozen => {
                debug!(route = %target, %location, "Guard frozen; withholding redirect");
                self.state = GuardState::Blocking { target };
                GuardTransition::quiet(self.state.clone())
            }
            GuardDecision::Redirect(target) => self.redirect(target, phase, location, navigator),
        }
    }

    fn begin_resolution(&mut self, phase: SessionPhase) {
        self.resolution = Some(phase);
        self.reverted_from = None;
        self.pending = None;
        self.redirects_this_resolution = 0;
        self.frozen = false;
    }

    fn redirect(
        &mut self,
        target: String,
        phase: SessionPhase,
        location: LocationGroup,
        navigator: &dyn Navigator,
    ) -> GuardTransition {
        let unhonored = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.group != location);
        if unhonored || self.redirects_this_resolution >= self.max_redirects {
            let failed = self
                .pending
                .take()
                .map_or(target, |pending| pending.target);
            return self.enter_loop(failed, phase, location, navigator);
        }

        info!(route = %target, from = %location, "Guard redirect");
        navigator.redirect_to(&target);
        self.redirects_this_resolution += 1;
        self.pending = Some(PendingRedirect {
            group: LocationGroup::of_route(&target),
            target: target.clone(),
        });
        self.state = GuardState::Blocking {
            target: target.clone(),
        };
        GuardTransition {
            state: self.state.clone(),
            redirected: Some(target),
            loop_detected: None,
        }
    }

    fn enter_loop(
        &mut self,
        failed_target: String,
        phase: SessionPhase,
        location: LocationGroup,
        navigator: &dyn Navigator,
    ) -> GuardTransition {
        let (reverted, fallback) = match phase {
            SessionPhase::Resolved(_) => (
                SessionPhase::Resolved(Role::DEFAULT),
                self.routes.home(Role::DEFAULT).to_string(),
            ),
            other => (other, self.routes.login.clone()),
        };
        warn!(
            failed = %failed_target,
            fallback = %fallback,
            %phase,
            %reverted,
            %location,
            redirects = self.redirects_this_resolution,
            "Navigation loop detected; freezing guard"
        );

        self.frozen = true;
        self.pending = None;
        if reverted != phase {
            self.resolution = Some(reverted);
            self.reverted_from = Some(phase);
        }
        self.last_input = Some((reverted, location));

        let redirected = if LocationGroup::of_route(&fallback) == location {
            self.state = GuardState::Passthrough;
            None
        } else {
            navigator.redirect_to(&fallback);
            self.state = GuardState::Blocking {
                target: fallback.clone(),
            };
            Some(fallback.clone())
        };

        GuardTransition {
            state: self.state.clone(),
            redirected,
            loop_detected: Some(LoopReport {
                failed_target,
                fallback,
                reverted,
            }),
        }
    }
}
