//! Per-board presence channels and event fan-out.
//!
//! Each board has one channel. Sessions join after passing the same
//! authorization predicate as reads, receive the current roster, and from
//! then on get roster deltas and domain events from other sessions' writes.
//! Delivery is fire-and-forget: a session whose receiver is gone is pruned,
//! never retried.
//!
//! Membership transitions run through the pure [`ChannelState`] machine;
//! this module only executes the actions it emits.

use crate::auth::{Action, Authorizer};
use board_core::{ChannelAction, ChannelEvent, ChannelState};
use board_types::{
    BoardError, BoardEvent, BoardId, BoardResult, ChannelFrame, Presence, RosterUpdate, SessionId,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Member {
    presence: Presence,
    state: ChannelState,
    sender: mpsc::UnboundedSender<ChannelFrame>,
}

/// Registry of live board channels.
pub struct BoardChannels {
    authorizer: Arc<dyn Authorizer>,
    channels: DashMap<BoardId, Vec<Member>>,
}

impl BoardChannels {
    /// Build the registry over the shared authorization policy.
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            channels: DashMap::new(),
        }
    }

    /// Join a board channel.
    ///
    /// On success returns the roster of sessions already present and the
    /// receiver for this session's frames. Everyone already joined receives
    /// a roster delta; the join itself is invisible to the joiner's own
    /// receiver.
    pub async fn join(
        &self,
        board_id: BoardId,
        presence: Presence,
    ) -> BoardResult<(Vec<Presence>, mpsc::UnboundedReceiver<ChannelFrame>)> {
        let (state, actions) = ChannelState::new().on_event(ChannelEvent::JoinRequested);
        debug_assert!(matches!(state, ChannelState::Joining));
        debug_assert!(actions.contains(&ChannelAction::RequestAuthorization));

        let allowed = self
            .authorizer
            .can_act_on(presence.user_id, Action::View, board_id)
            .await?;
        if !allowed {
            let (_, actions) = state.on_event(ChannelEvent::JoinDenied {
                reason: "join denied".to_string(),
            });
            debug_assert!(actions
                .iter()
                .any(|a| matches!(a, ChannelAction::SurfaceAuthError { .. })));
            return Err(BoardError::Forbidden {
                action: Action::View.to_string(),
                board_id,
            });
        }

        let mut members = self.channels.entry(board_id).or_default();

        // A session rejoining replaces its previous membership silently.
        members.retain(|m| m.presence.session_id != presence.session_id);

        let roster: Vec<Presence> = members
            .iter()
            .filter(|m| m.state.is_joined())
            .map(|m| m.presence.clone())
            .collect();
        let (state, actions) = state.on_event(ChannelEvent::JoinAuthorized {
            roster: roster.clone(),
        });
        debug_assert!(state.is_joined());
        debug_assert!(actions
            .iter()
            .any(|a| matches!(a, ChannelAction::DeliverRoster { .. })));

        let update = RosterUpdate::Joined(presence.clone());
        members.retain(|m| {
            m.sender
                .send(ChannelFrame::Roster(update.clone()))
                .is_ok()
        });

        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(board = %board_id, session = %presence.session_id, "session joined channel");
        members.push(Member {
            presence,
            state,
            sender,
        });

        Ok((roster, receiver))
    }

    /// Leave a board channel. Remaining members receive a roster delta.
    /// Leaving a channel one is not on is a no-op.
    pub fn leave(&self, board_id: BoardId, session_id: SessionId) {
        let Some(mut members) = self.channels.get_mut(&board_id) else {
            return;
        };
        let Some(index) = members
            .iter()
            .position(|m| m.presence.session_id == session_id)
        else {
            return;
        };

        let member = members.remove(index);
        let (state, actions) = member.state.on_event(ChannelEvent::LeaveRequested);
        debug_assert!(matches!(state, ChannelState::Left));
        if actions.contains(&ChannelAction::AnnounceLeave) {
            let update = RosterUpdate::Left { session_id };
            members.retain(|m| {
                m.sender
                    .send(ChannelFrame::Roster(update.clone()))
                    .is_ok()
            });
        }

        let empty = members.is_empty();
        drop(members);
        if empty {
            self.channels.remove_if(&board_id, |_, m| m.is_empty());
        }
        debug!(board = %board_id, session = %session_id, "session left channel");
    }

    /// Deliver a domain event to every joined session except the originator.
    ///
    /// Fire-and-forget: sessions with a closed receiver are pruned.
    pub fn publish(&self, board_id: BoardId, origin: SessionId, event: &BoardEvent) {
        let Some(mut members) = self.channels.get_mut(&board_id) else {
            return;
        };
        members.retain(|m| {
            if m.presence.session_id == origin || !m.state.is_joined() {
                return true;
            }
            match m.sender.send(ChannelFrame::Event(event.clone())) {
                Ok(()) => true,
                Err(_) => {
                    warn!(
                        board = %board_id,
                        session = %m.presence.session_id,
                        event = event.name(),
                        "dropping session with closed receiver"
                    );
                    false
                }
            }
        });
    }

    /// Tear down a board's channel entirely (the board was deleted).
    pub fn close(&self, board_id: BoardId) {
        if self.channels.remove(&board_id).is_some() {
            debug!(board = %board_id, "channel closed");
        }
    }

    /// Sessions currently joined to a board's channel.
    pub fn roster(&self, board_id: BoardId) -> Vec<Presence> {
        self.channels
            .get(&board_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| m.state.is_joined())
                    .map(|m| m.presence.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of sessions on a board's channel.
    pub fn member_count(&self, board_id: BoardId) -> usize {
        self.channels.get(&board_id).map_or(0, |m| m.len())
    }
}
