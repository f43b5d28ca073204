//! Standard response envelope and status helpers.
//!
//! Success bodies are wrapped in `{ "data": ..., "meta": ... }`; error
//! helpers produce the same `{ "error": { code, message } }` envelope the
//! [`crate::error::AppError`] mapping uses, so hook authors can short-circuit
//! with any status without hand-building JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(SuccessOne { data, meta: None })).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(SuccessOne { data, meta: None })).into_response()
}

pub fn ok_many<T: Serialize>(data: Vec<T>) -> Response {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
        .into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn status_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "error": { "code": code, "message": message.into() }
    });
    (status, Json(body)).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    status_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

pub fn unauthorized(message: impl Into<String>) -> Response {
    status_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn forbidden(message: impl Into<String>) -> Response {
    status_error(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn not_found(message: impl Into<String>) -> Response {
    status_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn conflict(message: impl Into<String>) -> Response {
    status_error(StatusCode::CONFLICT, "conflict", message)
}

pub fn unprocessable_entity(message: impl Into<String>) -> Response {
    status_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
}

pub fn too_many_requests(message: impl Into<String>) -> Response {
    status_error(StatusCode::TOO_MANY_REQUESTS, "too_many_requests", message)
}

pub fn internal_server_error(message: impl Into<String>) -> Response {
    status_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

pub fn service_unavailable(message: impl Into<String>) -> Response {
    status_error(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_helpers_set_expected_status() {
        assert_eq!(ok(serde_json::json!({"a": 1})).status(), StatusCode::OK);
        assert_eq!(created(serde_json::json!({})).status(), StatusCode::CREATED);
        assert_eq!(ok_many(vec![1, 2, 3]).status(), StatusCode::OK);
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn error_helpers_set_expected_status() {
        assert_eq!(bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            unprocessable_entity("x").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            internal_server_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            service_unavailable("x").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(too_many_requests("x").status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
