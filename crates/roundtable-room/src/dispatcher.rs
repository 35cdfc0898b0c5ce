//! Dispatcher: routes inbound chat to per-room sessions, creating them on
//! demand.

use std::collections::HashMap;
use std::sync::Arc;

use roundtable_protocol::{Command, InboundMessage, Outbound, RoomId};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, trace, warn};

use crate::session::spawn_session;
use crate::{GameConfig, QuestionProvider, RoomError, RoutingError, SessionHandle, SessionInfo};

/// Drops handles whose session has retired.
fn sweep(rooms: &mut HashMap<RoomId, SessionHandle>) {
    let before = rooms.len();
    rooms.retain(|_, h| !h.is_closed());
    let swept = before - rooms.len();
    if swept > 0 {
        debug!(swept, "retired sessions removed");
    }
}

/// What [`Dispatcher::route`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A new session was started for the room and got the message.
    Created,
    /// The message was queued on the room's existing session.
    Delivered,
    /// No session and the message can't start one. Dropped.
    Ignored,
}

/// Owns every room's session and routes messages to them.
///
/// The session map sits behind a Tokio mutex that is only held for the
/// lookup-or-create step. Delivery itself never waits: a full inbox is
/// reported as [`RoomError::Backlogged`] instead of stalling the caller,
/// so a busy room can't hold up intake for the others.
pub struct Dispatcher<P: QuestionProvider> {
    config: GameConfig,
    provider: Arc<P>,
    rooms: Mutex<HashMap<RoomId, SessionHandle>>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl<P: QuestionProvider> Dispatcher<P> {
    /// Validates `config` and returns the dispatcher together with the
    /// receiving end of the outbound event stream.
    pub fn new(
        config: GameConfig,
        provider: P,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Outbound>), RoomError> {
        config.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            config,
            provider: Arc::new(provider),
            rooms: Mutex::new(HashMap::new()),
            outbound: tx,
        };
        Ok((dispatcher, rx))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Routes one inbound message.
    ///
    /// Only a join signal can start a session. Anything else addressed to
    /// a room without a live session is dropped.
    ///
    /// # Errors
    /// [`RoomError::Routing`] for messages that can't belong to any game,
    /// [`RoomError::Backlogged`] when the room's inbox is full.
    pub async fn route(&self, msg: InboundMessage) -> Result<Routed, RoomError> {
        if let Err(e) = check_routable(&msg) {
            warn!(error = %e, "message dropped");
            return Err(e.into());
        }

        let is_join = Command::parse(&msg.text, self.config.bot_name.as_deref())
            == Some(Command::Join);
        let room_id = msg.room_id.clone();

        let (handle, created) = {
            let mut rooms = self.rooms.lock().await;
            match rooms.get(&room_id).cloned() {
                Some(handle) if !handle.is_closed() => (handle, false),
                _ if is_join => (self.start_session(&mut rooms, &room_id), true),
                Some(_) => {
                    rooms.remove(&room_id);
                    debug!(%room_id, "retired session removed");
                    return Ok(Routed::Ignored);
                }
                None => {
                    trace!(%room_id, "no session, message ignored");
                    return Ok(Routed::Ignored);
                }
            }
        };

        // The session may retire between lookup and delivery. A join that
        // loses that race starts a fresh session instead of vanishing.
        let retry = (is_join && !created).then(|| msg.clone());

        match (handle.deliver(msg), retry) {
            (Ok(()), _) if created => Ok(Routed::Created),
            (Ok(()), _) => Ok(Routed::Delivered),
            (Err(RoomError::Unavailable(_)), Some(msg)) => {
                let handle = {
                    let mut rooms = self.rooms.lock().await;
                    match rooms.get(&room_id).filter(|h| !h.is_closed()).cloned() {
                        Some(current) => current,
                        None => self.start_session(&mut rooms, &room_id),
                    }
                };
                handle.deliver(msg)?;
                Ok(Routed::Created)
            }
            (Err(e), _) => {
                warn!(%room_id, error = %e, "message not delivered");
                Err(e)
            }
        }
    }

    /// Returns a snapshot of the room's session.
    pub async fn session_info(&self, room_id: &RoomId) -> Result<SessionInfo, RoomError> {
        let handle = self.live_handle(room_id).await?;
        handle.info().await
    }

    /// Stops the room's session and forgets it. The next join in the room
    /// starts from scratch.
    pub async fn reset_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .lock()
            .await
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        handle.shutdown();
        info!(%room_id, "room reset");
        Ok(())
    }

    /// Number of rooms with a live session.
    pub async fn room_count(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        sweep(&mut rooms);
        rooms.len()
    }

    /// Rooms with a live session, sorted.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut rooms = self.rooms.lock().await;
        sweep(&mut rooms);
        let mut ids: Vec<RoomId> = rooms.keys().cloned().collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }

    /// Stops every session without waiting for any of them.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.rooms.lock().await.drain().map(|(_, h)| h).collect();
        let count = handles.len();
        for handle in handles {
            handle.shutdown();
        }
        info!(sessions = count, "dispatcher shut down");
    }

    async fn live_handle(&self, room_id: &RoomId) -> Result<SessionHandle, RoomError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .filter(|h| !h.is_closed())
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    fn start_session(
        &self,
        rooms: &mut HashMap<RoomId, SessionHandle>,
        room_id: &RoomId,
    ) -> SessionHandle {
        sweep(rooms);
        let handle = spawn_session(
            room_id.clone(),
            &self.config,
            Arc::clone(&self.provider),
            self.outbound.clone(),
        );
        rooms.insert(room_id.clone(), handle.clone());
        info!(%room_id, "session created");
        handle
    }
}

/// Rejects messages that can't belong to any game.
fn check_routable(msg: &InboundMessage) -> Result<(), RoutingError> {
    if msg.room_id.as_str().is_empty() {
        return Err(RoutingError::MissingRoom);
    }
    if msg.participant.id.as_str().is_empty() {
        return Err(RoutingError::MissingParticipant(msg.room_id.clone()));
    }
    if !msg.room_kind.hosts_games() {
        return Err(RoutingError::UnsupportedRoomKind(
            msg.room_kind,
            msg.room_id.clone(),
        ));
    }
    Ok(())
}
