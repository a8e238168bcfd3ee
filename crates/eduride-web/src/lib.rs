//! HTTP API for EduRide.
//!
//! This crate exposes the campus bus-tracking backend over a JSON REST API:
//!
//! - Admin login, dashboard counts and student/driver management.
//! - CRUD for buses, routes (with ordered stops) and schedules.
//! - Feedback submission and summaries.
//! - Student and driver portals guarded by bearer tokens, including GPS
//!   updates from drivers and live bus tracking for students.

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use server::WebServer;
pub use state::AppState;
