//! Identity and volunteer API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, mutate, rejected, success, ApiResult};
use crate::errors::{AppError, EngineError};
use crate::models::{
    Application, ApplicationDetails, LoginRequest, PublicIdentity, RegisterRequest,
};
use crate::AppState;

/// POST /api/users - Register a new identity.
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<PublicIdentity> {
    mutate(&state, "Registration", move |engine| {
        engine
            .register(&request)
            .map(|identity| identity.to_public())
    })
    .await
}

/// POST /api/login - Look up an identity by credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<PublicIdentity> {
    let engine = state.engine.lock().await;
    let revision_id = engine.revision_id();

    match engine.login(&request.username, &request.password) {
        Ok(identity) => success(identity.to_public(), revision_id),
        Err(e) => rejected("Login", e, revision_id),
    }
}

/// GET /api/users/:username - Get an identity's details.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<PublicIdentity> {
    let engine = state.engine.lock().await;
    let revision_id = engine.revision_id();

    match engine.user(&username) {
        Some(identity) => success(identity.to_public(), revision_id),
        None => error(
            AppError::Engine(EngineError::NotFound(format!("User {} not found", username))),
            revision_id,
        ),
    }
}

/// GET /api/users/:username/applications - A volunteer's own applications.
pub async fn list_user_applications(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Vec<Application>> {
    let engine = state.engine.lock().await;
    let revision_id = engine.revision_id();

    match engine.applications_for_volunteer(&username) {
        Ok(applications) => success(applications.into_iter().cloned().collect(), revision_id),
        Err(e) => rejected("Listing applications", e, revision_id),
    }
}

/// GET /api/users/:username/applications/:index - Application with opportunity and poster contact.
pub async fn get_user_application(
    State(state): State<AppState>,
    Path((username, index)): Path<(String, usize)>,
) -> ApiResult<ApplicationDetails> {
    let engine = state.engine.lock().await;
    let revision_id = engine.revision_id();

    match engine.application_details(&username, index) {
        Ok(details) => success(details, revision_id),
        Err(e) => rejected("Application details", e, revision_id),
    }
}

/// POST /api/users/:username/notifications - Collect undelivered decisions.
pub async fn take_notifications(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Vec<Application>> {
    mutate(&state, "Notifications", move |engine| {
        engine.take_notifications(&username)
    })
    .await
}
