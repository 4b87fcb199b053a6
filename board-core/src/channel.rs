//! Board-channel lifecycle state machine.
//!
//! This module provides a pure, side-effect-free state machine for a
//! session's membership of one board channel. The state machine takes events
//! as input and produces a new state plus a list of actions to execute.
//!
//! The actual I/O (running the authorization predicate, delivering frames)
//! is performed by `board-server`, not by this module. This enables instant
//! unit testing without transport mocks.

use board_types::{BoardEvent, Presence, RosterUpdate};

/// A session's membership state for one board channel - NO I/O, just
/// state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// Not subscribed to the channel.
    Unsubscribed,
    /// Join requested, waiting for the authorization predicate.
    Joining,
    /// Member of the channel, receiving roster updates and domain events.
    Joined,
    /// Voluntarily left; a fresh join starts over from `Unsubscribed`.
    Left,
}

impl ChannelState {
    /// Create a new state machine in the Unsubscribed state.
    pub fn new() -> Self {
        Self::Unsubscribed
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller is responsible
    /// for executing the returned actions.
    pub fn on_event(self, event: ChannelEvent) -> (Self, Vec<ChannelAction>) {
        match (self, event) {
            // From Unsubscribed
            (Self::Unsubscribed, ChannelEvent::JoinRequested) => {
                (Self::Joining, vec![ChannelAction::RequestAuthorization])
            }

            // From Joining
            (Self::Joining, ChannelEvent::JoinAuthorized { roster }) => {
                (Self::Joined, vec![ChannelAction::DeliverRoster { roster }])
            }
            (Self::Joining, ChannelEvent::JoinDenied { reason }) => (
                // Denial is visible to this session only; everyone else is
                // unaffected.
                Self::Unsubscribed,
                vec![ChannelAction::SurfaceAuthError { reason }],
            ),

            // From Joined
            (Self::Joined, ChannelEvent::RosterChanged { update }) => {
                (Self::Joined, vec![ChannelAction::ApplyRosterChange { update }])
            }
            (Self::Joined, ChannelEvent::EventReceived { event }) => {
                (Self::Joined, vec![ChannelAction::ApplyEvent { event }])
            }
            (Self::Joined, ChannelEvent::LeaveRequested) => {
                (Self::Left, vec![ChannelAction::AnnounceLeave])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if the session currently receives channel traffic.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined)
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in a channel membership's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The session asked to join the board channel.
    JoinRequested,
    /// The authorization predicate allowed the join.
    JoinAuthorized {
        /// Sessions already present on the channel.
        roster: Vec<Presence>,
    },
    /// The authorization predicate denied the join.
    JoinDenied {
        /// Why the join was denied.
        reason: String,
    },
    /// Another session joined or left.
    RosterChanged {
        /// The roster delta.
        update: RosterUpdate,
    },
    /// A domain event arrived from another session's write.
    EventReceived {
        /// The received event.
        event: BoardEvent,
    },
    /// The session asked to leave the channel.
    LeaveRequested,
}

/// Actions to be executed by the I/O layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Run the authorization predicate for this session and board.
    RequestAuthorization,
    /// Hand the current roster to the session.
    DeliverRoster {
        /// Sessions present at join time.
        roster: Vec<Presence>,
    },
    /// Surface an authorization error to this session only.
    SurfaceAuthError {
        /// Why the join was denied.
        reason: String,
    },
    /// Apply a roster delta to the session's local view.
    ApplyRosterChange {
        /// The roster delta.
        update: RosterUpdate,
    },
    /// Reconcile the session's local board view with a domain event.
    ApplyEvent {
        /// The event to apply.
        event: BoardEvent,
    },
    /// Tell the channel the session is leaving.
    AnnounceLeave,
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_types::{BoardId, SessionId, UserId};

    fn presence() -> Presence {
        Presence {
            session_id: SessionId::new(),
            user_id: UserId::new(),
            name: "alice".to_string(),
        }
    }

    #[test]
    fn starts_unsubscribed() {
        assert!(matches!(ChannelState::new(), ChannelState::Unsubscribed));
    }

    #[test]
    fn join_request_transitions_to_joining() {
        let (state, actions) = ChannelState::Unsubscribed.on_event(ChannelEvent::JoinRequested);
        assert!(matches!(state, ChannelState::Joining));
        assert!(actions
            .iter()
            .any(|a| matches!(a, ChannelAction::RequestAuthorization)));
    }

    #[test]
    fn authorized_join_delivers_roster() {
        let roster = vec![presence(), presence()];
        let (state, actions) = ChannelState::Joining.on_event(ChannelEvent::JoinAuthorized {
            roster: roster.clone(),
        });

        assert!(state.is_joined());
        assert!(actions.iter().any(
            |a| matches!(a, ChannelAction::DeliverRoster { roster: r } if r.len() == roster.len())
        ));
    }

    #[test]
    fn denied_join_returns_to_unsubscribed() {
        let (state, actions) = ChannelState::Joining.on_event(ChannelEvent::JoinDenied {
            reason: "not the board owner".into(),
        });

        assert!(matches!(state, ChannelState::Unsubscribed));
        assert!(actions.iter().any(|a| matches!(
            a,
            ChannelAction::SurfaceAuthError { reason } if reason.contains("owner")
        )));
    }

    #[test]
    fn joined_session_applies_events() {
        let event = BoardEvent::BoardUpdated {
            board_id: BoardId::new(),
        };
        let (state, actions) = ChannelState::Joined.on_event(ChannelEvent::EventReceived {
            event: event.clone(),
        });

        assert!(state.is_joined());
        assert_eq!(
            actions,
            vec![ChannelAction::ApplyEvent { event }]
        );
    }

    #[test]
    fn joined_session_applies_roster_changes() {
        let update = RosterUpdate::Joined(presence());
        let (state, actions) = ChannelState::Joined.on_event(ChannelEvent::RosterChanged {
            update: update.clone(),
        });

        assert!(state.is_joined());
        assert_eq!(actions, vec![ChannelAction::ApplyRosterChange { update }]);
    }

    #[test]
    fn leave_transitions_to_left() {
        let (state, actions) = ChannelState::Joined.on_event(ChannelEvent::LeaveRequested);
        assert!(matches!(state, ChannelState::Left));
        assert!(actions
            .iter()
            .any(|a| matches!(a, ChannelAction::AnnounceLeave)));
    }

    #[test]
    fn events_before_join_are_ignored() {
        let event = BoardEvent::BoardUpdated {
            board_id: BoardId::new(),
        };
        let (state, actions) =
            ChannelState::Unsubscribed.on_event(ChannelEvent::EventReceived { event });

        assert!(matches!(state, ChannelState::Unsubscribed));
        assert!(actions.is_empty());
    }

    #[test]
    fn left_state_is_terminal_for_this_membership() {
        let (state, actions) = ChannelState::Left.on_event(ChannelEvent::JoinRequested);
        assert!(matches!(state, ChannelState::Left));
        assert!(actions.is_empty());
    }

    #[test]
    fn full_join_lifecycle() {
        let state = ChannelState::new();

        let (state, _) = state.on_event(ChannelEvent::JoinRequested);
        let (state, _) = state.on_event(ChannelEvent::JoinAuthorized { roster: vec![] });
        assert!(state.is_joined());

        let (state, _) = state.on_event(ChannelEvent::RosterChanged {
            update: RosterUpdate::Joined(presence()),
        });
        let (state, _) = state.on_event(ChannelEvent::LeaveRequested);
        assert!(matches!(state, ChannelState::Left));
    }
}
