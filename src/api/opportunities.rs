//! Opportunity API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{mutate, success, ApiResult};
use crate::models::{Application, ApplyRequest, Opportunity, PostOpportunityRequest};
use crate::AppState;

/// GET /api/opportunities - List all opportunities in posting order.
pub async fn list_opportunities(State(state): State<AppState>) -> ApiResult<Vec<Opportunity>> {
    let engine = state.engine.lock().await;
    success(engine.opportunities().to_vec(), engine.revision_id())
}

/// POST /api/opportunities - Post a new opportunity.
pub async fn post_opportunity(
    State(state): State<AppState>,
    Json(request): Json<PostOpportunityRequest>,
) -> ApiResult<Opportunity> {
    mutate(&state, "Posting", move |engine| {
        engine.post_opportunity(
            &request.title,
            &request.description,
            &request.location,
            &request.date,
            &request.posted_by,
        )
    })
    .await
}

/// POST /api/opportunities/:index/applications - Apply to an opportunity.
pub async fn apply_to_opportunity(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(request): Json<ApplyRequest>,
) -> ApiResult<Application> {
    mutate(&state, "Application", move |engine| {
        engine.apply(&request.username, index, request.disability_info.as_deref())
    })
    .await
}
