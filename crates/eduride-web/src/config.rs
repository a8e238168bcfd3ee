//! Server configuration.
//!
//! [`ServerConfig`] is built once at startup from environment variables
//! (after the binary has loaded any `.env` file) and passed explicitly to
//! everything that needs it. Defaults are provided via the [`Default`]
//! implementation, and [`ServerConfig::from_lookup`] lets tests supply
//! variables without touching the process environment.

use chrono::Duration;
use eduride_auth::{AuthError, DEFAULT_TTL_MINUTES, TokenConfig};
use tracing::warn;

/// Errors raised while reading configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the HTTP server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Reported by the liveness endpoints.
    ///
    /// Default: **"TCE EduRide API"**.
    pub app_name: String,

    /// Path prefix for every API route.
    ///
    /// Default: **"/api/v1"**.
    pub api_prefix: String,

    /// Enables debug-level logging when `RUST_LOG` is unset.
    pub debug: bool,

    /// SQLite connection string.
    ///
    /// Default: **"sqlite:///./tce_eduride.db"**.
    pub database_url: String,

    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,

    /// Interface to bind. Default: **127.0.0.1**.
    pub host: String,

    /// Port to listen on. Default: **8000**.
    pub port: u16,

    /// HMAC secret for bearer tokens. `None` means a random per-process secret.
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in minutes. Default: **1440**.
    pub token_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "TCE EduRide API".into(),
            api_prefix: "/api/v1".into(),
            debug: false,
            database_url: "sqlite:///./tce_eduride.db".into(),
            cors_origins: vec![
                "http://localhost:3000".into(),
                "http://localhost:8081".into(),
            ],
            host: "127.0.0.1".into(),
            port: 8000,
            jwt_secret: None,
            token_ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get("APP_NAME") {
            config.app_name = name;
        }
        if let Some(prefix) = get("API_V1_PREFIX") {
            config.api_prefix = normalize_prefix(&prefix);
        }
        if let Some(debug) = get("DEBUG") {
            config.debug = parse_bool("DEBUG", &debug)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = parse_origins(&origins)?;
        }
        if let Some(host) = get("BIND_ADDR") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "PORT",
                value: port.clone(),
                reason: format!("{e}"),
            })?;
        }
        config.jwt_secret = get("JWT_SECRET");
        if let Some(ttl) = get("TOKEN_TTL_MINUTES") {
            config.token_ttl_minutes = match ttl.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "TOKEN_TTL_MINUTES",
                        value: ttl,
                        reason: "expected a positive number of minutes".into(),
                    });
                }
            };
        }

        Ok(config)
    }

    /// Return the `host:port` string the server binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Signing configuration for bearer tokens.
    ///
    /// Without `JWT_SECRET` a random secret is generated, so tokens do not
    /// survive a restart.
    pub fn token_config(&self) -> Result<TokenConfig, AuthError> {
        let config = match &self.jwt_secret {
            Some(secret) => TokenConfig::new(secret.as_bytes().to_vec()),
            None => {
                warn!("JWT_SECRET is not set; using a random per-process signing secret");
                TokenConfig::random()?
            }
        };
        Ok(config.with_ttl(Duration::minutes(self.token_ttl_minutes)))
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("app_name", &self.app_name)
            .field("api_prefix", &self.api_prefix)
            .field("debug", &self.debug)
            .field("database_url", &self.database_url)
            .field("cors_origins", &self.cors_origins)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

/// Ensure a leading slash and strip trailing ones. `/` becomes empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

/// Accept either a JSON array (`["http://a","http://b"]`) or a
/// comma-separated list.
fn parse_origins(value: &str) -> Result<Vec<String>, ConfigError> {
    let value = value.trim();
    let origins: Vec<String> = if value.starts_with('[') {
        serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
            key: "CORS_ORIGINS",
            value: value.to_string(),
            reason: e.to_string(),
        })?
    } else {
        value.split(',').map(|s| s.trim().to_string()).collect()
    };
    Ok(origins.into_iter().filter(|o| !o.is_empty()).collect())
}
