//! Pre-shared-key protection for the API and constant-time secret comparison.
//!
//! Credential checks in the engine reuse [`constant_time_compare`] so that
//! password matching does not leak prefix length through timing.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware that rejects requests without the configured key.
///
/// With no key configured every request passes.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let verdict = provided_key(request.headers()).map(|key| constant_time_compare(key, &expected));
    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing API key"),
    }
}

/// Key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// Compare two secrets without short-circuiting on the first differing byte.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: 0,
    }
    .into_response()
}
