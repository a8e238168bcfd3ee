//! # eduride-auth
//!
//! Role-based login for EduRide.
//!
//! [`Authenticator`] checks a username or email and password against the
//! store and, on success, returns the role-specific profile together with
//! a signed bearer token. [`TokenIssuer`] validates those tokens for the
//! endpoints that need to know who is calling.
//!
//! ```ignore
//! use eduride_auth::{Authenticator, TokenConfig, TokenIssuer};
//!
//! let tokens = TokenIssuer::new(TokenConfig::new(secret));
//! let auth = Authenticator::new(db.clone(), tokens);
//! let login = auth.login_admin("admin", "admin123").await?;
//! let claims = auth.verify(&login.access_token)?;
//! ```

pub mod error;
pub mod login;
pub mod token;

pub use error::{AuthError, Result};
pub use login::{
    AdminLogin, AdminProfile, Authenticator, DriverLogin, DriverProfile, StudentLogin,
    StudentProfile, TOKEN_TYPE,
};
pub use token::{Claims, DEFAULT_TTL_MINUTES, Role, TokenConfig, TokenIssuer};
