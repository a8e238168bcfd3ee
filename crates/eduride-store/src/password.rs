//! Password hashing via PBKDF2-HMAC-SHA256 (ring).
//!
//! Passwords are stored as `base64(salt):base64(hash)` strings, using
//! 600,000 iterations per OWASP 2023 recommendations. Verification goes
//! through `ring::pbkdf2::verify`, which compares in constant time.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{StoreError, StoreResult};

/// PBKDF2-HMAC-SHA256 with 600,000 iterations (OWASP 2023).
const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(600_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Well-formed hash that no password matches: a zero salt and a zero key.
/// Checked against on a lookup miss so unknown accounts cost a full derivation.
const UNMATCHABLE_HASH: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Hash a password and return a storable string of the form `base64(salt):base64(hash)`.
pub fn hash_password(password: &str) -> StoreResult<String> {
    if password.is_empty() {
        return Err(StoreError::InvalidArgument(
            "password must not be empty".into(),
        ));
    }

    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StoreError::PasswordHash("failed to generate random salt".into()))?;

    let mut hash = [0u8; KEY_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!("{}:{}", BASE64.encode(salt), BASE64.encode(hash)))
}

/// Verify a password against a stored hash string (`base64(salt):base64(hash)`).
pub fn verify_password(password: &str, stored: &str) -> StoreResult<bool> {
    let Some((salt, expected_hash)) = stored.split_once(':') else {
        return Err(StoreError::PasswordHash("malformed password hash".into()));
    };

    let salt = BASE64
        .decode(salt)
        .map_err(|e| StoreError::PasswordHash(format!("invalid salt encoding: {e}")))?;
    let expected_hash = BASE64
        .decode(expected_hash)
        .map_err(|e| StoreError::PasswordHash(format!("invalid hash encoding: {e}")))?;

    Ok(pbkdf2::verify(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &expected_hash,
    )
    .is_ok())
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> StoreResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verify `password` against `stored` on the blocking pool.
///
/// With `stored = None` the derivation still runs against a hash nothing
/// matches, and the result is `false`.
pub async fn verify_password_async(password: String, stored: Option<String>) -> StoreResult<bool> {
    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => verify_password(&password, UNMATCHABLE_HASH).map(|_| false),
    })
    .await?
}
