use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use super::models::{CallSessionModel, Room};
use super::repository::CallSessionRepository;
use super::token::generate_room_token;
use crate::message::models::MessageModel;
use crate::message::repository::MessageRepository;
use crate::shared::AppError;

/// Body of the system message posted to a conversation when a call starts
const CALL_STARTED_BODY: &str = "Call started";

/// Registry of currently active call rooms.
///
/// Holds live room state in process memory and mirrors lifecycle events to
/// persisted call-session records. Rooms exist only while their participant
/// set is non-empty; removing the last participant closes the room.
///
/// The internal mutex is never held across an await: each operation takes it
/// for its in-memory step and releases it before persistence I/O, so
/// concurrent operations may interleave between the two steps. No ordering is
/// guaranteed between interleaved calls.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
    call_sessions: Arc<dyn CallSessionRepository + Send + Sync>,
    messages: Arc<dyn MessageRepository + Send + Sync>,
}

impl RoomRegistry {
    pub fn new(
        call_sessions: Arc<dyn CallSessionRepository + Send + Sync>,
        messages: Arc<dyn MessageRepository + Send + Sync>,
    ) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            call_sessions,
            messages,
        }
    }

    /// Allocates a room token not currently in use
    fn allocate_token(&self) -> String {
        let rooms = self.rooms.lock().unwrap();
        loop {
            let token = generate_room_token();
            if !rooms.contains_key(&token) {
                return token;
            }
        }
    }

    /// Starts a new call: persists a call-session record (participant list is
    /// the creator plus any initial participants), posts a call-start system
    /// message to the conversation, and registers an in-memory room containing
    /// only the creator.
    ///
    /// Persistence failure surfaces as an error and the room is not
    /// registered.
    #[instrument(skip(self, participant_ids))]
    pub async fn create_room(
        &self,
        creator_id: &str,
        participant_ids: &[String],
        conversation_id: &str,
    ) -> Result<Room, AppError> {
        let token = self.allocate_token();
        debug!(room_id = %token, creator_id = %creator_id, "Allocated room token");

        // Persisted list records everyone named at creation; only the creator
        // joins the live set.
        let mut session_participants = vec![creator_id.to_string()];
        session_participants.extend(participant_ids.iter().cloned());

        let session = CallSessionModel::new(
            token.clone(),
            conversation_id.to_string(),
            session_participants,
        );
        self.call_sessions.create_session(&session).await?;

        let message = MessageModel::new_system(
            conversation_id.to_string(),
            creator_id.to_string(),
            CALL_STARTED_BODY.to_string(),
        );
        self.messages.create_system_message(&message).await?;

        let room = Room::new(token, session.id.clone(), creator_id.to_string());
        let snapshot = room.clone();

        let mut rooms = self.rooms.lock().unwrap();
        rooms.insert(room.id.clone(), room);

        info!(
            room_id = %snapshot.id,
            session_id = %snapshot.session_id,
            creator_id = %creator_id,
            "Call room created"
        );

        Ok(snapshot)
    }

    /// Pure lookup, returns a snapshot of the room if it is currently tracked
    pub fn get_room(&self, room_id: &str) -> Option<Room> {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(room_id).cloned()
    }

    /// Adds a user to a room's live participant set.
    ///
    /// Returns `Ok(false)` if the room is not tracked. The in-memory insert is
    /// idempotent, but a persisted append is issued on every call, including
    /// re-adds of an existing member.
    #[instrument(skip(self))]
    pub async fn add_participant(&self, room_id: &str, user_id: &str) -> Result<bool, AppError> {
        let session_id = {
            let mut rooms = self.rooms.lock().unwrap();
            let room = match rooms.get_mut(room_id) {
                Some(room) => room,
                None => {
                    debug!(room_id = %room_id, "Room not found for join");
                    return Ok(false);
                }
            };

            room.add_participant(user_id.to_string());
            room.session_id.clone()
        };

        self.call_sessions
            .append_participant(&session_id, user_id)
            .await?;

        info!(room_id = %room_id, user_id = %user_id, "Participant joined room");
        Ok(true)
    }

    /// Removes a user from a room's live participant set.
    ///
    /// Returns `Ok(false)` if the room is not tracked. If the set becomes
    /// empty the room is closed before returning.
    #[instrument(skip(self))]
    pub async fn remove_participant(&self, room_id: &str, user_id: &str) -> Result<bool, AppError> {
        let now_empty = {
            let mut rooms = self.rooms.lock().unwrap();
            let room = match rooms.get_mut(room_id) {
                Some(room) => room,
                None => {
                    debug!(room_id = %room_id, "Room not found for leave");
                    return Ok(false);
                }
            };

            room.remove_participant(user_id);
            room.is_empty()
        };

        info!(room_id = %room_id, user_id = %user_id, "Participant left room");

        if now_empty {
            info!(room_id = %room_id, "Last participant left, closing room");
            self.close_room(room_id).await?;
        }

        Ok(true)
    }

    /// Closes a room: finalizes the persisted record with an end timestamp and
    /// floored whole-second duration, then removes the room from the registry.
    ///
    /// Returns `Ok(false)` if the room is not tracked. This is the only path
    /// that records a duration. A finalize failure leaves the room tracked so
    /// the close can be retried.
    #[instrument(skip(self))]
    pub async fn close_room(&self, room_id: &str) -> Result<bool, AppError> {
        let room = {
            let rooms = self.rooms.lock().unwrap();
            match rooms.get(room_id) {
                Some(room) => room.clone(),
                None => {
                    debug!(room_id = %room_id, "Room not found for close");
                    return Ok(false);
                }
            }
        };

        let ended_at = Utc::now();
        let duration_seconds = room.elapsed_seconds(ended_at);

        self.call_sessions
            .finalize_session(&room.session_id, ended_at, duration_seconds)
            .await?;

        let removed = {
            let mut rooms = self.rooms.lock().unwrap();
            rooms.remove(room_id).is_some()
        };
        if !removed {
            // Lost a race with another close between finalize and removal
            warn!(room_id = %room_id, "Room already removed during close");
        }

        info!(
            room_id = %room_id,
            session_id = %room.session_id,
            duration_seconds = duration_seconds,
            "Call room closed"
        );

        Ok(true)
    }

    /// Snapshot of all currently tracked rooms, order not significant
    pub fn all_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().unwrap();
        rooms.values().cloned().collect()
    }

    /// Snapshot of all tracked rooms containing the given user
    pub fn user_rooms(&self, user_id: &str) -> Vec<Room> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .values()
            .filter(|room| room.has_participant(user_id))
            .cloned()
            .collect()
    }
}
