//! Error types for the auth crate.
//!
//! Every login failure that depends on the submitted credentials collapses
//! into [`AuthError::InvalidCredentials`], so a caller cannot learn whether
//! an account exists.

use eduride_store::StoreError;

/// Unified error type for login and token handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown identifier, wrong password or inactive account.
    #[error("incorrect credentials")]
    InvalidCredentials,

    /// The bearer token is malformed, has a bad signature or wrong issuer.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// What failed during validation.
        reason: String,
    },

    /// The bearer token was valid but is past its `exp`.
    #[error("token expired")]
    TokenExpired,

    /// An error propagated from the store crate.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Signing a token or generating a secret failed.
    #[error("failed to issue token: {0}")]
    TokenIssue(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, AuthError>;
