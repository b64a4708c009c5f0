//! Error types for the BandSync application

use thiserror::Error;

/// Authentication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, malformed payload or expired token
    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,
}
