use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// In-memory record of an active call room.
///
/// Lives only inside the registry map; the persisted lifecycle counterpart is
/// [`CallSessionModel`]. A room exists only while its participant set is
/// non-empty.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: String,         // Room token, unique among active rooms
    pub session_id: String, // Persisted call-session record (1:1)
    pub participants: HashSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Creates a new room containing only the creator.
    pub fn new(id: String, session_id: String, creator_id: String) -> Self {
        let mut participants = HashSet::new();
        participants.insert(creator_id);

        Self {
            id,
            session_id,
            participants,
            created_at: Utc::now(),
        }
    }

    /// Check if a user is currently in this room
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    /// Add a user to the live participant set (no-op if already present)
    pub fn add_participant(&mut self, user_id: String) {
        self.participants.insert(user_id);
    }

    /// Remove a user from the live participant set
    pub fn remove_participant(&mut self, user_id: &str) {
        self.participants.remove(user_id);
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Elapsed whole seconds since the room was created, floored.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

/// Database model for the call_sessions table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CallSessionModel {
    pub id: String,         // UUID v4 as string
    pub room_token: String, // Room token at creation time
    pub conversation_id: String,
    pub participant_ids: Vec<String>, // Appended-to without dedupe
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl CallSessionModel {
    /// Creates a new call-session model with a generated ID
    pub fn new(room_token: String, conversation_id: String, participant_ids: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_token,
            conversation_id,
            participant_ids,
            started_at: Utc::now(),
            ended_at: None,
            duration_seconds: None,
        }
    }

    /// Checks whether the session has been finalized with an end time
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}
