use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use tower::ServiceExt; // for `oneshot`

use callrooms::call::{self, types::{LeaveCallResponse, RoomResponse}};
use callrooms::{
    AppState, CallSessionRepository, InMemoryCallSessionRepository, InMemoryMessageRepository,
    RoomRegistry,
};

struct TestApp {
    app: Router,
    call_sessions: Arc<InMemoryCallSessionRepository>,
    messages: Arc<InMemoryMessageRepository>,
}

fn test_app() -> TestApp {
    let call_sessions = Arc::new(InMemoryCallSessionRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(RoomRegistry::new(call_sessions.clone(), messages.clone()));
    let state = AppState::new(registry);

    let app = Router::new()
        .route("/calls", post(call::start_call).get(call::list_calls))
        .route("/calls/:room_id", get(call::get_call))
        .route("/calls/:room_id/join", post(call::join_call))
        .route("/calls/:room_id/leave", post(call::leave_call))
        .route("/calls/:room_id/end", post(call::end_call))
        .route("/users/:user_id/calls", get(call::list_user_calls))
        .with_state(state);

    TestApp {
        app,
        call_sessions,
        messages,
    }
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn response_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_full_call_lifecycle_over_http() {
    let test_app = test_app();
    let app = test_app.app;

    // u1 starts a call naming u2
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls",
            r#"{"creator_id": "u1", "conversation_id": "conv-1", "participant_ids": ["u2"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let room: RoomResponse = response_json(response).await;

    // Only the creator is live
    assert_eq!(room.participants, vec!["u1".to_string()]);

    // The persisted session records both participants and the call-start message was posted
    let session = test_app
        .call_sessions
        .get_session(&room.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        session.participant_ids,
        vec!["u1".to_string(), "u2".to_string()]
    );
    assert_eq!(test_app.messages.messages_for("conv-1").len(), 1);

    // u2 joins
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/calls/{}/join", room.room_id),
            r#"{"user_id": "u2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let joined: RoomResponse = response_json(response).await;
    assert_eq!(joined.participants, vec!["u1".to_string(), "u2".to_string()]);

    // u1 leaves, room stays open
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/calls/{}/leave", room.room_id),
            r#"{"user_id": "u1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let left: LeaveCallResponse = response_json(response).await;
    assert!(!left.closed);

    // u2 leaves, room auto-closes
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/calls/{}/leave", room.room_id),
            r#"{"user_id": "u2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let left: LeaveCallResponse = response_json(response).await;
    assert!(left.closed);

    // The room is gone and the session is finalized with a floored duration
    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/calls/{}", room.room_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let session = test_app
        .call_sessions
        .get_session(&room.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(session.ended_at.is_some());
    assert_eq!(session.duration_seconds, Some(0));
}

#[tokio::test]
async fn test_explicit_end_finalizes_session() {
    let test_app = test_app();
    let app = test_app.app;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls",
            r#"{"creator_id": "u1", "conversation_id": "conv-1"}"#,
        ))
        .await
        .unwrap();
    let room: RoomResponse = response_json(response).await;

    let response = app
        .clone()
        .oneshot(empty_request("POST", &format!("/calls/{}/end", room.room_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session = test_app
        .call_sessions
        .get_session(&room.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(session.ended_at.is_some());
    assert!(session.duration_seconds.is_some());

    // Listing no longer includes the room
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/calls"))
        .await
        .unwrap();
    let rooms: Vec<RoomResponse> = response_json(response).await;
    assert!(rooms.is_empty());
}

#[tokio::test]
async fn test_user_calls_track_membership_across_rooms() {
    let test_app = test_app();
    let app = test_app.app;

    // Two concurrent calls
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls",
            r#"{"creator_id": "u1", "conversation_id": "conv-1"}"#,
        ))
        .await
        .unwrap();
    let room1: RoomResponse = response_json(response).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls",
            r#"{"creator_id": "u2", "conversation_id": "conv-2"}"#,
        ))
        .await
        .unwrap();
    let room2: RoomResponse = response_json(response).await;

    // u1 also joins u2's call
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/calls/{}/join", room2.room_id),
            r#"{"user_id": "u1"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/users/u1/calls"))
        .await
        .unwrap();
    let u1_rooms: Vec<RoomResponse> = response_json(response).await;
    assert_eq!(u1_rooms.len(), 2);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/users/u2/calls"))
        .await
        .unwrap();
    let u2_rooms: Vec<RoomResponse> = response_json(response).await;
    assert_eq!(u2_rooms.len(), 1);
    assert_eq!(u2_rooms[0].room_id, room2.room_id);

    // u1 leaving room1 drops it from their calls
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/calls/{}/leave", room1.room_id),
            r#"{"user_id": "u1"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/users/u1/calls"))
        .await
        .unwrap();
    let u1_rooms: Vec<RoomResponse> = response_json(response).await;
    assert_eq!(u1_rooms.len(), 1);
    assert_eq!(u1_rooms[0].room_id, room2.room_id);
}

#[tokio::test]
async fn test_actions_on_unknown_room_return_not_found() {
    let test_app = test_app();
    let app = test_app.app;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls/never-issued/join",
            r#"{"user_id": "u1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls/never-issued/leave",
            r#"{"user_id": "u1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/calls/never-issued/end"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
