use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{
    EndCallResponse, JoinCallRequest, LeaveCallRequest, LeaveCallResponse, RoomResponse,
    StartCallRequest,
};
use crate::shared::{AppError, AppState};

/// HTTP handler for starting a call
///
/// POST /calls
/// Creates the call-session record and returns the live room snapshot
#[instrument(name = "start_call", skip(state, request))]
pub async fn start_call(
    State(state): State<AppState>,
    Json(request): Json<StartCallRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    info!(creator_id = %request.creator_id, conversation_id = %request.conversation_id, "Starting call");

    let room = state
        .registry
        .create_room(
            &request.creator_id,
            &request.participant_ids,
            &request.conversation_id,
        )
        .await?;

    info!(room_id = %room.id, session_id = %room.session_id, "Call started");

    Ok(Json(room.into()))
}

/// HTTP handler for listing all active calls
///
/// GET /calls
#[instrument(name = "list_calls", skip(state))]
pub async fn list_calls(State(state): State<AppState>) -> Json<Vec<RoomResponse>> {
    let rooms = state.registry.all_rooms();
    info!(room_count = rooms.len(), "Active calls listed");

    Json(rooms.into_iter().map(RoomResponse::from).collect())
}

/// HTTP handler for looking up a single call room
///
/// GET /calls/{room_id}
#[instrument(name = "get_call", skip(state))]
pub async fn get_call(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .registry
        .get_room(&room_id)
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    Ok(Json(room.into()))
}

/// HTTP handler for joining a call
///
/// POST /calls/{room_id}/join
#[instrument(name = "join_call", skip(state, request))]
pub async fn join_call(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinCallRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let joined = state
        .registry
        .add_participant(&room_id, &request.user_id)
        .await?;
    if !joined {
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    let room = state
        .registry
        .get_room(&room_id)
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    Ok(Json(room.into()))
}

/// HTTP handler for leaving a call
///
/// POST /calls/{room_id}/leave
/// Leaving as the last participant closes the room
#[instrument(name = "leave_call", skip(state, request))]
pub async fn leave_call(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<LeaveCallRequest>,
) -> Result<Json<LeaveCallResponse>, AppError> {
    let left = state
        .registry
        .remove_participant(&room_id, &request.user_id)
        .await?;
    if !left {
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    let closed = state.registry.get_room(&room_id).is_none();

    Ok(Json(LeaveCallResponse { room_id, closed }))
}

/// HTTP handler for ending a call
///
/// POST /calls/{room_id}/end
#[instrument(name = "end_call", skip(state))]
pub async fn end_call(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<EndCallResponse>, AppError> {
    let ended = state.registry.close_room(&room_id).await?;
    if !ended {
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    Ok(Json(EndCallResponse { room_id }))
}

/// HTTP handler for listing the calls a user is currently in
///
/// GET /users/{user_id}/calls
#[instrument(name = "list_user_calls", skip(state))]
pub async fn list_user_calls(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<RoomResponse>> {
    let rooms = state.registry.user_rooms(&user_id);

    Json(rooms.into_iter().map(RoomResponse::from).collect())
}
