//! REST API module.
//!
//! Handlers lock the shared engine, call exactly one engine operation and wrap
//! the outcome in the response envelope. Operations that write the store run
//! through [`mutate`] so file I/O stays off the async workers.

mod datastore;
mod opportunities;
mod recruiters;
mod users;

pub use datastore::*;
pub use opportunities::*;
pub use recruiters::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::engine::Engine;
use crate::errors::{AppError, AppErrorWithRevision, EngineError};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Log a rejected engine operation and turn it into an error response.
fn rejected<T: Serialize>(operation: &str, err: EngineError, revision_id: i64) -> ApiResult<T> {
    tracing::warn!(code = err.code(), "{} rejected: {}", operation, err);
    error(err.into(), revision_id)
}

/// Run a mutating engine operation on the blocking pool.
///
/// The engine lock is held until the operation, including its store write,
/// has finished. Errors report the revision seen before the operation.
async fn mutate<T, F>(state: &AppState, operation: &'static str, f: F) -> ApiResult<T>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&mut Engine) -> Result<T, EngineError> + Send + 'static,
{
    let mut engine = state.engine.clone().lock_owned().await;
    let revision_id = engine.revision_id();

    let outcome = tokio::task::spawn_blocking(move || {
        let result = f(&mut *engine);
        (result, engine.revision_id())
    })
    .await;

    match outcome {
        Ok((Ok(value), current)) => success(value, current),
        Ok((Err(e), _)) => rejected(operation, e, revision_id),
        Err(e) => {
            tracing::error!("{} task failed: {}", operation, e);
            error(
                AppError::Internal(format!("{} did not complete", operation)),
                revision_id,
            )
        }
    }
}
