use rand::{distr::Alphanumeric, Rng};

/// Length of a generated room token.
pub const ROOM_TOKEN_LEN: usize = 12;

/// Generates a random room token.
///
/// Tokens are 12 characters drawn from `[A-Za-z0-9]` using the thread-local
/// cryptographically seeded RNG. Uniqueness among active rooms is enforced by
/// the registry at registration time.
pub fn generate_room_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_TOKEN_LEN)
        .map(char::from)
        .collect()
}
