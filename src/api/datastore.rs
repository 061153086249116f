//! Datastore API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{DatastoreView, RevisionInfo};
use crate::AppState;

/// GET /api/datastore - Get the full datastore without passwords.
pub async fn get_datastore(State(state): State<AppState>) -> ApiResult<DatastoreView> {
    let engine = state.engine.lock().await;
    let view = engine.view();
    let revision_id = view.revision_id;
    success(view, revision_id)
}

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let engine = state.engine.lock().await;
    success(engine.revision_info(), engine.revision_id())
}
