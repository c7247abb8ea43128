use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::MessageModel;
use crate::shared::AppError;

/// Trait for conversation message persistence operations
#[async_trait]
pub trait MessageRepository {
    async fn create_system_message(&self, message: &MessageModel) -> Result<(), AppError>;
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<String, Vec<MessageModel>>>, // keyed by conversation id
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the messages recorded for a conversation (useful for tests)
    pub fn messages_for(&self, conversation_id: &str) -> Vec<MessageModel> {
        self.messages
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message))]
    async fn create_system_message(&self, message: &MessageModel) -> Result<(), AppError> {
        debug!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            "Recording system message in memory"
        );

        let mut messages = self.messages.lock().unwrap();
        messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());

        Ok(())
    }
}

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message))]
    async fn create_system_message(&self, message: &MessageModel) -> Result<(), AppError> {
        debug!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            "Recording system message in database"
        );

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, body, is_system, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.body)
        .bind(message.is_system)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, message_id = %message.id, "Failed to record system message in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(message_id = %message.id, "System message recorded in database");
        Ok(())
    }
}
