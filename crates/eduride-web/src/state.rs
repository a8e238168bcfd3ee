//! Shared application state for the web server.
//!
//! [`AppState`] is wrapped in an `Arc` and shared across all request
//! handlers. It holds the configuration, one store per entity (all backed by
//! the same [`Database`] handle) and the [`Authenticator`].

use eduride_auth::{Authenticator, TokenIssuer};
use eduride_store::{
    BusStore, Database, DriverStore, FeedbackStore, LocationStore, RouteStore,
    ScheduleStore, StudentStore,
};

use crate::config::ServerConfig;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,

    /// Database handle, used directly by the health check.
    pub db: Database,

    pub students: StudentStore,
    pub drivers: DriverStore,
    pub buses: BusStore,
    pub routes: RouteStore,
    pub schedules: ScheduleStore,
    pub feedback: FeedbackStore,
    pub locations: LocationStore,

    /// Login and bearer-token validation.
    pub auth: Authenticator,
}

impl AppState {
    pub fn new(config: ServerConfig, db: Database, tokens: TokenIssuer) -> Self {
        Self {
            config,
            students: StudentStore::new(db.clone()),
            drivers: DriverStore::new(db.clone()),
            buses: BusStore::new(db.clone()),
            routes: RouteStore::new(db.clone()),
            schedules: ScheduleStore::new(db.clone()),
            feedback: FeedbackStore::new(db.clone()),
            locations: LocationStore::new(db.clone()),
            auth: Authenticator::new(db.clone(), tokens),
            db,
        }
    }
}
