// Library crate for the call room registry service
// This file exposes the public API for integration tests

pub mod call;
pub mod message;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use call::models::{CallSessionModel, Room};
pub use call::registry::RoomRegistry;
pub use call::repository::{CallSessionRepository, InMemoryCallSessionRepository};
pub use message::repository::{InMemoryMessageRepository, MessageRepository};
pub use shared::{AppError, AppState};
