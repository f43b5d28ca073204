//! Auth routes: register, login, refresh. Mounted when the auth service is
//! enabled.

use crate::error::AppError;
use crate::response;
use crate::state::AppState;
use axum::{extract::State, response::Response, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let auth = state.auth.as_ref().ok_or(AppError::ServiceNotEnabled("auth"))?;
    let map = match body {
        Value::Object(m) => m.into_iter().collect(),
        _ => return Err(AppError::BadRequest("body must be a JSON object".into())),
    };
    let row = auth.register(map).await?;
    Ok(response::created(row))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Response, AppError> {
    let auth = state.auth.as_ref().ok_or(AppError::ServiceNotEnabled("auth"))?;
    let tokens = auth.attempt_login(&body.email, &body.password).await?;
    Ok(response::ok(tokens))
}

#[derive(Deserialize)]
struct RefreshBody {
    token: Option<String>,
}

async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<Response, AppError> {
    let auth = state.auth.as_ref().ok_or(AppError::ServiceNotEnabled("auth"))?;
    let token = body
        .token
        .ok_or_else(|| AppError::BadRequest("missing token field in request body".into()))?;
    let access_token = auth.refresh(&token).await?;
    Ok(response::ok(serde_json::json!({ "access_token": access_token })))
}
