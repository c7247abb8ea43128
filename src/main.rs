mod call;
mod message;
mod shared;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use call::registry::RoomRegistry;
use call::repository::{
    CallSessionRepository, InMemoryCallSessionRepository, PostgresCallSessionRepository,
};
use message::repository::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository};
use shared::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callrooms=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting call room registry server");

    // Wire persistence: PostgreSQL when DATABASE_URL is set, in-memory otherwise
    let (call_sessions, messages): (
        Arc<dyn CallSessionRepository + Send + Sync>,
        Arc<dyn MessageRepository + Send + Sync>,
    ) = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            info!("Using PostgreSQL persistence");
            (
                Arc::new(PostgresCallSessionRepository::new(pool.clone())),
                Arc::new(PostgresMessageRepository::new(pool)),
            )
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory persistence");
            (
                Arc::new(InMemoryCallSessionRepository::new()),
                Arc::new(InMemoryMessageRepository::new()),
            )
        }
    };

    let registry = Arc::new(RoomRegistry::new(call_sessions, messages));
    let app_state = AppState::new(registry);

    // build our application routes
    let app = Router::new()
        .route("/calls", post(call::start_call).get(call::list_calls))
        .route("/calls/:room_id", get(call::get_call))
        .route("/calls/:room_id/join", post(call::join_call))
        .route("/calls/:room_id/leave", post(call::leave_call))
        .route("/calls/:room_id/end", post(call::end_call))
        .route("/users/:user_id/calls", get(call::list_user_calls))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
