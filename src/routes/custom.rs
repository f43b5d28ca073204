//! Mounts custom routes registered through the router facade.

use crate::error::AppError;
use crate::request::RequestContext;
use crate::router::{CustomRoute, RouteHandler};
use crate::state::{read_lock, AppState};
use axum::{
    extract::{Query, RawPathParams, State},
    http::{HeaderMap, Method},
    response::Response,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub fn custom_router(state: AppState, routes: Vec<CustomRoute>) -> Router {
    let mut router = Router::new();
    for route in routes {
        let handler = Arc::clone(&route.handler);
        let middlewares = route.middlewares.clone();
        let method = route.method.clone();
        let path = route.path.clone();

        let handler_path = path.clone();
        let handler_method = method.clone();
        let h = move |State(state): State<AppState>,
                      raw_params: RawPathParams,
                      Query(query): Query<HashMap<String, String>>,
                      headers: HeaderMap,
                      body: Option<Json<Value>>| {
            let handler = Arc::clone(&handler);
            let middlewares = middlewares.clone();
            let path = handler_path.clone();
            let method = handler_method.clone();
            let params: HashMap<String, String> = (&raw_params)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            async move {
                dispatch_custom(
                    state,
                    handler,
                    middlewares,
                    method,
                    path,
                    params,
                    query,
                    headers,
                    body.map(|Json(v)| v),
                )
                .await
            }
        };

        let method_router = match method {
            Method::GET => get(h),
            Method::POST => post(h),
            Method::PUT => put(h),
            Method::PATCH => patch(h),
            Method::DELETE => delete(h),
            other => {
                tracing::warn!(method = %other, path = %path, "unsupported custom route method, skipping");
                continue;
            }
        };
        router = router.route(&path, method_router);
    }
    router.with_state(state)
}

#[allow(clippy::too_many_arguments)]
async fn dispatch_custom(
    state: AppState,
    handler: RouteHandler,
    middlewares: Vec<String>,
    method: Method,
    path: String,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let chain = read_lock(&state.middlewares).chain(&middlewares)?;
    let mut ctx = RequestContext {
        method,
        path,
        params,
        query,
        headers,
        body,
        user: None,
    };
    for mw in chain {
        ctx = mw(ctx).await?;
    }
    handler(Arc::new(ctx)).await
}
