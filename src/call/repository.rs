use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::CallSessionModel;
use crate::shared::AppError;

/// Trait for call-session persistence operations
#[async_trait]
pub trait CallSessionRepository {
    async fn create_session(&self, session: &CallSessionModel) -> Result<(), AppError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<CallSessionModel>, AppError>;

    /// Appends a participant id to the session's participant list.
    /// No dedupe is performed: repeated appends of the same id accumulate.
    async fn append_participant(&self, session_id: &str, user_id: &str) -> Result<(), AppError>;

    /// Finalizes the session with an end timestamp and total duration
    async fn finalize_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), AppError>;
}

/// In-memory implementation of CallSessionRepository for development and testing
///
/// Data is stored in memory and lost when the application restarts.
pub struct InMemoryCallSessionRepository {
    sessions: Mutex<HashMap<String, CallSessionModel>>,
}

impl Default for InMemoryCallSessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCallSessionRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of sessions in the repository
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl CallSessionRepository for InMemoryCallSessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &CallSessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, room_token = %session.room_token, "Creating call session in memory");

        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Call session already exists in memory");
            return Err(AppError::DatabaseError(
                "Call session already exists".to_string(),
            ));
        }
        sessions.insert(session.id.clone(), session.clone());

        debug!(session_id = %session.id, "Call session created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<CallSessionModel>, AppError> {
        debug!(session_id = %session_id, "Fetching call session from memory");

        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(session_id).cloned())
    }

    #[instrument(skip(self))]
    async fn append_participant(&self, session_id: &str, user_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, user_id = %user_id, "Appending participant to call session in memory");

        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(session_id).ok_or_else(|| {
            warn!(session_id = %session_id, "Call session not found for participant append");
            AppError::NotFound("Call session not found".to_string())
        })?;

        session.participant_ids.push(user_id.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn finalize_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), AppError> {
        debug!(
            session_id = %session_id,
            duration_seconds = duration_seconds,
            "Finalizing call session in memory"
        );

        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(session_id).ok_or_else(|| {
            warn!(session_id = %session_id, "Call session not found for finalize");
            AppError::NotFound("Call session not found".to_string())
        })?;

        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration_seconds);

        debug!(session_id = %session_id, "Call session finalized in memory");
        Ok(())
    }
}

/// PostgreSQL implementation of call-session repository
pub struct PostgresCallSessionRepository {
    pool: PgPool,
}

impl PostgresCallSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallSessionRepository for PostgresCallSessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &CallSessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, room_token = %session.room_token, "Creating call session in database");

        sqlx::query(
            "INSERT INTO call_sessions (id, room_token, conversation_id, participant_ids, started_at, ended_at, duration_seconds) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
        .bind(&session.id)
        .bind(&session.room_token)
        .bind(&session.conversation_id)
        .bind(&session.participant_ids)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.duration_seconds)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create call session in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(session_id = %session.id, "Call session created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<CallSessionModel>, AppError> {
        debug!(session_id = %session_id, "Fetching call session from database");

        let row = sqlx::query(
            "SELECT id, room_token, conversation_id, participant_ids, started_at, ended_at, duration_seconds \
             FROM call_sessions WHERE id = $1"
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to fetch call session from database");
            AppError::DatabaseError(e.to_string())
        })?;

        let session = row.map(|row| CallSessionModel {
            id: row.get("id"),
            room_token: row.get("room_token"),
            conversation_id: row.get("conversation_id"),
            participant_ids: row.get("participant_ids"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
            duration_seconds: row.get("duration_seconds"),
        });

        Ok(session)
    }

    #[instrument(skip(self))]
    async fn append_participant(&self, session_id: &str, user_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, user_id = %user_id, "Appending participant to call session in database");

        let result = sqlx::query(
            "UPDATE call_sessions SET participant_ids = array_append(participant_ids, $2) WHERE id = $1",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to append participant in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(session_id = %session_id, "Call session not found for participant append");
            return Err(AppError::NotFound("Call session not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn finalize_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> Result<(), AppError> {
        debug!(
            session_id = %session_id,
            duration_seconds = duration_seconds,
            "Finalizing call session in database"
        );

        let result = sqlx::query(
            "UPDATE call_sessions SET ended_at = $2, duration_seconds = $3 WHERE id = $1",
        )
        .bind(session_id)
        .bind(ended_at)
        .bind(duration_seconds)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to finalize call session in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(session_id = %session_id, "Call session not found for finalize");
            return Err(AppError::NotFound("Call session not found".to_string()));
        }

        debug!(session_id = %session_id, "Call session finalized in database");
        Ok(())
    }
}
