//! Main web server setup and startup.
//!
//! [`WebServer`] composes the Axum router, registers all routes under the
//! configured API prefix, and runs the HTTP listener until Ctrl-C.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use eduride_auth::TokenIssuer;
use eduride_store::Database;

use crate::api::{self, admin, buses, driver, feedback, routes, schedules, student};
use crate::config::ServerConfig;
use crate::state::AppState;

/// The EduRide HTTP server.
pub struct WebServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a server over an opened and migrated database.
    pub fn new(config: ServerConfig, db: Database, tokens: TokenIssuer) -> Self {
        let state = Arc::new(AppState::new(config.clone(), db, tokens));
        Self { config, state }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        self.config.addr()
    }

    /// Build the Axum router with all routes registered.
    pub fn router(&self) -> Router {
        let api = api_routes();
        let app = Router::new()
            .route("/", get(api::health::root))
            .route("/health", get(api::health::health));
        let app = if self.config.api_prefix.is_empty() {
            app.merge(api)
        } else {
            app.nest(&self.config.api_prefix, api)
        };

        app.layer(self.cors())
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.state))
    }

    fn cors(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Start the server and block until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot be bound.
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.addr();
        let router = self.router();

        info!(addr = %addr, prefix = %self.config.api_prefix, "starting web server");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("web server stopped");
        Ok(())
    }
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Admin.
        .route("/admin/login", post(admin::login))
        .route("/admin/dashboard", get(admin::dashboard))
        .route(
            "/admin/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route(
            "/admin/students/{id}",
            get(admin::get_student)
                .put(admin::update_student)
                .delete(admin::delete_student),
        )
        .route(
            "/admin/drivers",
            get(admin::list_drivers).post(admin::create_driver),
        )
        .route(
            "/admin/drivers/{id}",
            get(admin::get_driver)
                .put(admin::update_driver)
                .delete(admin::delete_driver),
        )
        // Fleet.
        .route("/buses", get(buses::list).post(buses::create))
        .route(
            "/buses/{id}",
            get(buses::get).put(buses::update).delete(buses::delete),
        )
        .route("/routes", get(routes::list).post(routes::create))
        .route(
            "/routes/{id}",
            get(routes::get).put(routes::replace).delete(routes::delete),
        )
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route(
            "/schedules/{id}",
            get(schedules::get)
                .put(schedules::update)
                .delete(schedules::delete),
        )
        // Feedback.
        .route("/feedback", get(feedback::list).post(feedback::submit))
        .route("/feedback/summary", get(feedback::summary))
        // Students.
        .route("/students/login", post(student::login))
        .route("/students/dashboard", get(student::dashboard))
        .route("/students/track-bus", get(student::track_bus))
        // Drivers.
        .route("/drivers/login", post(driver::login))
        .route("/drivers/dashboard", get(driver::dashboard))
        .route("/drivers/location", post(driver::update_location))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
