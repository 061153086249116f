//! Recruiter review API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{mutate, success, ApiResult};
use crate::models::{Application, Opportunity, ProcessNextRequest, SetStatusRequest};
use crate::AppState;

/// GET /api/recruiters/:username/opportunities - Opportunities posted by a recruiter.
pub async fn list_recruiter_opportunities(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Vec<Opportunity>> {
    let engine = state.engine.lock().await;
    let opportunities = engine
        .opportunities_posted_by(&username)
        .into_iter()
        .cloned()
        .collect();
    success(opportunities, engine.revision_id())
}

/// GET /api/recruiters/:username/applications - Applications to a recruiter's opportunities.
///
/// Positions in this list are the indices accepted by `set_application_status`.
pub async fn list_recruiter_applications(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Vec<Application>> {
    let engine = state.engine.lock().await;
    let applications = engine
        .applications_for_recruiter(&username)
        .into_iter()
        .cloned()
        .collect();
    success(applications, engine.revision_id())
}

/// PUT /api/recruiters/:username/applications/:index - Decide an application.
pub async fn set_application_status(
    State(state): State<AppState>,
    Path((username, index)): Path<(String, usize)>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Application> {
    mutate(&state, "Status update", move |engine| {
        engine.set_status(index, request.status, &username)
    })
    .await
}

/// GET /api/recruiters/:username/next-pending - Peek at the oldest pending application.
pub async fn peek_next_pending(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Option<Application>> {
    let engine = state.engine.lock().await;
    success(
        engine.peek_next_pending(&username).cloned(),
        engine.revision_id(),
    )
}

/// POST /api/recruiters/:username/next-pending - Decide the oldest pending application.
///
/// Take and finalize happen under one lock, so no other request can observe
/// the application while it is out of the collection.
pub async fn process_next_pending(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<ProcessNextRequest>,
) -> ApiResult<Option<Application>> {
    mutate(&state, "Processing", move |engine| {
        engine.process_next_pending(&username, request.status)
    })
    .await
}
