use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::Room;

/// Request payload for starting a call
#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    pub creator_id: String,
    pub conversation_id: String,
    /// Recorded on the persisted session; not auto-joined to the live room
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

/// Request payload for joining a call
#[derive(Debug, Deserialize)]
pub struct JoinCallRequest {
    pub user_id: String,
}

/// Request payload for leaving a call
#[derive(Debug, Deserialize)]
pub struct LeaveCallRequest {
    pub user_id: String,
}

/// Response for room creation and room lookups
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room_id: String,
    pub session_id: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        let mut participants: Vec<String> = room.participants.into_iter().collect();
        participants.sort(); // live set is unordered; sort for stable output

        Self {
            room_id: room.id,
            session_id: room.session_id,
            participants,
            created_at: room.created_at,
        }
    }
}

/// Response for leaving a call
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveCallResponse {
    pub room_id: String,
    /// True when this leave emptied the room and closed it
    pub closed: bool,
}

/// Response for ending a call
#[derive(Debug, Serialize, Deserialize)]
pub struct EndCallResponse {
    pub room_id: String,
}
