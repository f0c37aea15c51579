use crate::storage::{Database, Server};
use axum::http::StatusCode;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_LENGTH: usize = 64;

/// Generate a new agent token. Returns (plaintext, hash); only the hash
/// is ever persisted, the plaintext is shown once to the operator.
pub fn generate_token() -> (String, String) {
    let plain: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hashed = hash_token(&plain);
    (plain, hashed)
}

pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Deactivated,
    Storage(rusqlite::Error),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::InvalidToken => write!(f, "Invalid authentication token"),
            AuthError::Deactivated => write!(f, "Server is deactivated"),
            AuthError::Storage(_) => write!(f, "Authentication temporarily unavailable"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Deactivated => StatusCode::FORBIDDEN,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Resolve a presented bearer token to an active server. The plaintext is
/// hashed and compared against stored digests; it is never logged or kept.
pub fn resolve_server(db: &Database, token: Option<&str>) -> Result<Server, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;

    let server = db
        .find_server_by_token_hash(&hash_token(token))
        .map_err(AuthError::Storage)?
        .ok_or(AuthError::InvalidToken)?;

    if !server.is_active {
        return Err(AuthError::Deactivated);
    }

    Ok(server)
}
