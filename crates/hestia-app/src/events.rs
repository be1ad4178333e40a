//! Session event channel.
//!
//! A typed broadcast channel replacing ambient notification callbacks.
//! Publishing and subscribing are separate operations; a publisher never
//! needs to know whether anyone is listening.

use crate::core::SessionPhase;
use crate::errors::ToastLevel;
use hestia_core::Role;
use tokio::sync::broadcast;

/// Events emitted by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The resolved phase changed
    PhaseChanged(SessionPhase),
    /// The guard issued a redirect
    Redirected {
        /// Target route
        route: String,
    },
    /// The guard detected a redirect loop and froze
    NavigationLoop {
        /// Route of the terminal redirect
        fallback: String,
    },
    /// The surface that started a switch should close
    SwitcherDismissed {
        /// Requested role
        target: Role,
    },
    /// A role switch was confirmed by the server
    RoleSwitched(Role),
    /// A user-visible message
    Toast {
        /// Severity
        level: ToastLevel,
        /// Message text
        message: String,
    },
}

/// Broadcast bus for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish a toast.
    pub fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.publish(SessionEvent::Toast {
            level,
            message: message.into(),
        });
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.publish(SessionEvent::RoleSwitched(Role::Provider));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_sees_events_in_order() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(SessionEvent::SwitcherDismissed {
            target: Role::Provider,
        });
        bus.toast(ToastLevel::Error, "nope");

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::SwitcherDismissed {
                target: Role::Provider
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Toast {
                level: ToastLevel::Error,
                message: "nope".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
