// Public API - what other modules can use
pub use handlers::{
    end_call, get_call, join_call, leave_call, list_calls, list_user_calls, start_call,
};
pub use registry::RoomRegistry;

// Internal modules
pub mod handlers;
pub mod models;
pub mod registry;
pub mod repository;
pub mod token;
pub mod types;
