//! Connection registry: live connections and the room sessions they hold.
//!
//! # Architecture
//!
//! ```text
//! connections                         rooms
//! ├── conn-a → alice, outbox, session  room-1 ─┬─ conn-a
//! ├── conn-b → bob,   outbox, session          └─ conn-b
//! └── conn-c → carol, outbox, (none)   room-2 ─── ...
//! ```
//!
//! A connection is registered when the transport opens and unregistered when
//! it closes. Between those it attaches to at most one room at a time. The
//! registry is a derived view over the room aggregate: it is re-synced after
//! every durable mutation and never consulted as the source of truth for
//! membership.

use std::collections::{BTreeSet, HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, RoomId, UserId};
use crate::domain::presence::{ConnectionSession, MemberRole, VoiceChannel};
use crate::domain::room::{Room, TeamId};

use crate::application::protocol::{ServerMessage, VoiceMember, VoiceRosters};

/// Bounded queue feeding one connection's writer task.
pub type Outbox = mpsc::Sender<ServerMessage>;

struct ConnectionEntry {
    user: AuthenticatedUser,
    outbox: Outbox,
    session: Option<ConnectionSession>,
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl RegistryState {
    /// Clear a connection's session and drop it from its room index.
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<ConnectionSession> {
        let session = self.connections.get_mut(connection_id)?.session.take()?;
        if let Some(members) = self.rooms.get_mut(&session.room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&session.room_id);
            }
        }
        Some(session)
    }

    fn sessions_in(&self, room_id: &RoomId) -> impl Iterator<Item = &ConnectionSession> {
        self.rooms
            .get(room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.connections.get(id))
            .filter_map(|entry| entry.session.as_ref())
    }
}

/// Result of attaching a connection to a room.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    /// The connection's own previous session, if it was in a room.
    pub previous: Option<ConnectionSession>,
    /// Older sessions of the same user in the same room, now detached.
    pub superseded: Vec<ConnectionSession>,
}

/// Effects of re-reading role and team from the room.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Sessions whose user is no longer a member, now detached.
    pub detached: Vec<ConnectionSession>,
    /// Sessions moved to `none` because their team channel became invalid,
    /// with the channel they left.
    pub voice_evicted: Vec<(ConnectionSession, VoiceChannel)>,
}

/// Ephemeral per-process map of live connections.
///
/// A single lock guards both indexes so they never disagree.
#[derive(Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connection lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Track a freshly authenticated connection.
    pub async fn register(&self, connection_id: ConnectionId, user: AuthenticatedUser, outbox: Outbox) {
        self.state.write().await.connections.insert(
            connection_id,
            ConnectionEntry {
                user,
                outbox,
                session: None,
            },
        );
    }

    /// Forget a connection, returning the session it held.
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionSession> {
        let mut state = self.state.write().await;
        let session = state.detach(connection_id);
        state.connections.remove(connection_id);
        session
    }

    /// Attach a connection to a room, superseding the user's older sessions
    /// in that room.
    ///
    /// Returns `None` if the connection is not registered.
    pub async fn attach(&self, session: ConnectionSession) -> Option<Attachment> {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(&session.connection_id) {
            return None;
        }

        let previous = state.detach(&session.connection_id);
        let older: Vec<ConnectionId> = state
            .sessions_in(&session.room_id)
            .filter(|s| s.user_id == session.user_id)
            .map(|s| s.connection_id)
            .collect();
        let superseded = older
            .iter()
            .filter_map(|id| state.detach(id))
            .collect();

        state
            .rooms
            .entry(session.room_id)
            .or_default()
            .insert(session.connection_id);
        if let Some(entry) = state.connections.get_mut(&session.connection_id) {
            entry.session = Some(session);
        }

        Some(Attachment {
            previous,
            superseded,
        })
    }

    /// Detach everyone from a room (room deleted).
    pub async fn detach_room(&self, room_id: &RoomId) -> Vec<ConnectionSession> {
        let mut state = self.state.write().await;
        let ids: Vec<ConnectionId> = state
            .rooms
            .get(room_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.iter().filter_map(|id| state.detach(id)).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session state
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-read role and team for every session in the room.
    ///
    /// Sessions of departed users are detached; sessions whose voice channel
    /// is no longer allowed are moved to `none`.
    pub async fn sync_room(&self, room: &Room) -> SyncReport {
        let mut state = self.state.write().await;
        let ids: Vec<ConnectionId> = state
            .rooms
            .get(room.id())
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        let mut report = SyncReport::default();
        for id in ids {
            let still_member = match state.connections.get_mut(&id).and_then(|e| e.session.as_mut()) {
                Some(session) => {
                    if !session.sync_with(room) {
                        false
                    } else {
                        if !session.may_join(session.voice_channel) {
                            let left = session.voice_channel;
                            session.voice_channel = VoiceChannel::None;
                            report.voice_evicted.push((session.clone(), left));
                        }
                        true
                    }
                }
                None => continue,
            };
            if !still_member {
                if let Some(session) = state.detach(&id) {
                    report.detached.push(session);
                }
            }
        }
        report
    }

    /// Apply a change to a connection's session and return the new value.
    pub async fn update_session<F>(&self, connection_id: &ConnectionId, f: F) -> Option<ConnectionSession>
    where
        F: FnOnce(&mut ConnectionSession),
    {
        let mut state = self.state.write().await;
        let session = state.connections.get_mut(connection_id)?.session.as_mut()?;
        f(session);
        Some(session.clone())
    }

    /// Like [`update_session`](Self::update_session), but `f` may refuse.
    ///
    /// The check and the write happen under one lock, so a concurrent
    /// `sync_room` cannot slip in between. `f` must leave the session
    /// untouched when it returns `Err`.
    pub async fn try_update_session<T, E, F>(
        &self,
        connection_id: &ConnectionId,
        f: F,
    ) -> Option<Result<(T, ConnectionSession), E>>
    where
        F: FnOnce(&mut ConnectionSession) -> Result<T, E>,
    {
        let mut state = self.state.write().await;
        let session = state.connections.get_mut(connection_id)?.session.as_mut()?;
        Some(f(session).map(|value| (value, session.clone())))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn user(&self, connection_id: &ConnectionId) -> Option<AuthenticatedUser> {
        self.state
            .read()
            .await
            .connections
            .get(connection_id)
            .map(|e| e.user.clone())
    }

    pub async fn session(&self, connection_id: &ConnectionId) -> Option<ConnectionSession> {
        self.state
            .read()
            .await
            .connections
            .get(connection_id)
            .and_then(|e| e.session.clone())
    }

    /// Users with at least one live session in the room.
    pub async fn online_users(&self, room_id: &RoomId) -> HashSet<UserId> {
        self.state
            .read()
            .await
            .sessions_in(room_id)
            .map(|s| s.user_id.clone())
            .collect()
    }

    pub async fn is_online(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.state
            .read()
            .await
            .sessions_in(room_id)
            .any(|s| &s.user_id == user_id)
    }

    pub async fn voice_rosters(&self, room_id: &RoomId) -> VoiceRosters {
        let state = self.state.read().await;
        let mut rosters = VoiceRosters::default();
        for session in state.sessions_in(room_id) {
            rosters.push(
                session.voice_channel,
                VoiceMember {
                    user_id: session.user_id.clone(),
                    username: session.display_name.clone(),
                    muted: session.muted,
                },
            );
        }
        rosters
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delivery targets
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn outbox(&self, connection_id: &ConnectionId) -> Option<Outbox> {
        self.state
            .read()
            .await
            .connections
            .get(connection_id)
            .map(|e| e.outbox.clone())
    }

    /// Outboxes of sessions in a room that match a predicate.
    pub async fn room_outboxes<F>(&self, room_id: &RoomId, mut include: F) -> Vec<(ConnectionId, Outbox)>
    where
        F: FnMut(&ConnectionSession) -> bool,
    {
        let state = self.state.read().await;
        state
            .sessions_in(room_id)
            .filter(|s| include(s))
            .filter_map(|s| {
                state
                    .connections
                    .get(&s.connection_id)
                    .map(|e| (s.connection_id, e.outbox.clone()))
            })
            .collect()
    }

    /// Outboxes of every connection a user has open, attached or not.
    pub async fn user_outboxes(&self, user_id: &UserId) -> Vec<(ConnectionId, Outbox)> {
        self.state
            .read()
            .await
            .connections
            .iter()
            .filter(|(_, e)| &e.user.id == user_id)
            .map(|(id, e)| (*id, e.outbox.clone()))
            .collect()
    }
}

/// Whether a session belongs to a team's player audience.
pub(crate) fn is_team_player(session: &ConnectionSession, team: TeamId) -> bool {
    session.role == MemberRole::Player && session.team_id == Some(team)
}
