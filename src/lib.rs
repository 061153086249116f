//! Volunteer Management Backend
//!
//! A workflow engine for volunteer registration, opportunity posting and
//! application review, persisted to a JSON file and served over REST.

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use engine::Engine;

/// Application state shared across all handlers.
///
/// The engine's collections refer to each other by username and title, so
/// they are guarded by one lock and updated together.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<Engine>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: Engine, config: Config) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Datastore
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        // Identities
        .route("/users", post(api::register_user))
        .route("/login", post(api::login))
        .route("/users/{username}", get(api::get_user))
        .route(
            "/users/{username}/applications",
            get(api::list_user_applications),
        )
        .route(
            "/users/{username}/applications/{index}",
            get(api::get_user_application),
        )
        .route(
            "/users/{username}/notifications",
            post(api::take_notifications),
        )
        // Opportunities
        .route("/opportunities", get(api::list_opportunities))
        .route("/opportunities", post(api::post_opportunity))
        .route(
            "/opportunities/{index}/applications",
            post(api::apply_to_opportunity),
        )
        // Recruiter review
        .route(
            "/recruiters/{username}/opportunities",
            get(api::list_recruiter_opportunities),
        )
        .route(
            "/recruiters/{username}/applications",
            get(api::list_recruiter_applications),
        )
        .route(
            "/recruiters/{username}/applications/{index}",
            put(api::set_application_status),
        )
        .route(
            "/recruiters/{username}/next-pending",
            get(api::peek_next_pending).post(api::process_next_pending),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
