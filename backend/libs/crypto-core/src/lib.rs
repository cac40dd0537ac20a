//! Shared security primitives for the social network backend
//!
//! - `jwt`: access token issuing and validation (HS256, shared secret)
//! - `password`: Argon2id password hashing and verification
pub mod jwt;
pub mod password;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("JWT secret too short: need at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },

    #[error("JWT keys already initialized")]
    AlreadyInitialized,

    #[error("JWT keys not initialized. Call initialize_jwt() during startup.")]
    NotInitialized,

    #[error("Failed to generate token: {0}")]
    TokenGeneration(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token validation failed: {0}")]
    InvalidToken(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
