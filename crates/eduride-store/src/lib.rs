//! # eduride-store
//!
//! Storage engine for EduRide.
//!
//! Provides SQLite-backed persistence for accounts (admins, students,
//! drivers), the fleet, routes with ordered stops, schedules, feedback and
//! GPS pings. Passwords are hashed with PBKDF2 before they are written.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  AdminStore  StudentStore  DriverStore        │
//! │  BusStore    RouteStore    ScheduleStore      │
//! │  FeedbackStore             LocationStore      │
//! ├───────────────────────────────────────────────┤
//! │  Database (rusqlite WAL, foreign keys on)     │
//! │  Migrations (versioned, transactional)        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use eduride_store::{Database, BusStore, seed_defaults};
//!
//! let db = Database::connect("sqlite:///./tce_eduride.db").await?;
//! seed_defaults(&db).await?;
//! let buses = BusStore::new(db.clone());
//! println!("{} buses", buses.count().await?);
//! ```

pub mod admin;
pub mod bus;
pub mod db;
pub mod driver;
pub mod error;
pub mod feedback;
pub mod location;
pub mod migration;
pub mod password;
pub mod route;
pub mod schedule;
pub mod seed;
pub mod student;

/// Default status for students, drivers, buses, routes and schedules.
pub const ACTIVE: &str = "active";

// ── re-exports ───────────────────────────────────────────────────────

pub use admin::{Admin, AdminStore};
pub use bus::{Bus, BusStore, BusUpdate, NewBus};
pub use db::{Database, DbLocation};
pub use driver::{Driver, DriverStore, DriverUpdate, NewDriver};
pub use error::{StoreError, StoreResult};
pub use feedback::{Feedback, FeedbackStore, FeedbackSummary, NewFeedback, UserType};
pub use location::{Location, LocationStore, NewLocation};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
pub use route::{NewRoute, NewStop, Route, RouteStop, RouteStore, RouteWithStops};
pub use schedule::{NewSchedule, ScheduleDetail, ScheduleStore, weekday_name};
pub use seed::{SeedReport, seed_defaults};
pub use student::{NewStudent, Student, StudentStore, StudentUpdate};
