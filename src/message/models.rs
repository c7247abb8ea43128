use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the messages table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MessageModel {
    pub id: String, // UUID v4 as string
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub is_system: bool, // System messages mark lifecycle events (e.g. call start)
    pub created_at: DateTime<Utc>,
}

impl MessageModel {
    /// Creates a new system message for a conversation
    pub fn new_system(conversation_id: String, sender_id: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            sender_id,
            body,
            is_system: true,
            created_at: Utc::now(),
        }
    }
}
