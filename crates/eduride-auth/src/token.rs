//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the principal id, role and login
//! identifier. Validation is stateless: no database lookup is needed to
//! accept or reject a token.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TTL_MINUTES: i64 = 24 * 60;

/// Value of the `iss` claim.
pub const DEFAULT_ISSUER: &str = "eduride";

/// Kind of principal a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Driver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id, as a decimal string.
    pub sub: String,
    pub role: Role,
    /// Username for admins, email for students and drivers.
    pub identifier: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    /// The numeric id of the principal.
    pub fn principal_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken {
            reason: format!("subject {:?} is not an id", self.sub),
        })
    }
}

/// Signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    /// How long an issued token stays valid.
    pub ttl: Duration,
    pub issuer: String,
}

impl TokenConfig {
    /// Configuration signing with `secret` and the default lifetime.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Configuration with a fresh random 256-bit secret.
    ///
    /// Tokens signed with it do not survive a restart.
    pub fn random() -> Result<Self> {
        let mut secret = [0u8; 32];
        SystemRandom::new()
            .fill(&mut secret)
            .map_err(|_| AuthError::TokenIssue("failed to generate signing secret".into()))?;
        Ok(Self::new(secret.to_vec()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Issues and validates tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&config.secret);
        let decoding_key = DecodingKey::from_secret(&config.secret);
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign a token for principal `id` with `role`.
    pub fn issue(&self, role: Role, id: i64, identifier: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: id.to_string(),
            role,
            identifier: identifier.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.ttl).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    /// Check signature, issuer and expiry, then return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                kind => AuthError::InvalidToken {
                    reason: format!("{kind:?}"),
                },
            }
        })?;
        Ok(data.claims)
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
