//! Mounts generated CRUD paths and dispatches requests through the registry.
//!
//! Handlers do not capture hooks; they resolve the current route descriptor
//! from the shared registry on every request, so a customize call after
//! startup swaps behavior without touching the router.

use crate::crud::types::{CrudKind, CrudRoute, CrudTarget};
use crate::error::AppError;
use crate::request::RequestContext;
use crate::state::{read_lock, AppState};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One axum route per generated CRUD path currently in the registry.
pub fn crud_router(state: AppState) -> Router {
    let mounts: Vec<(String, String, String)> = {
        let registry = read_lock(&state.cruds);
        registry
            .entries()
            .map(|e| {
                (
                    e.entity.name.clone(),
                    e.collection_path.clone(),
                    e.member_path(),
                )
            })
            .collect()
    };

    let mut router = Router::new();
    for (name, collection, member) in mounts {
        let index_name = name.clone();
        let index = move |State(state): State<AppState>,
                          Query(query): Query<HashMap<String, String>>,
                          headers: HeaderMap| {
            let name = index_name.clone();
            async move {
                dispatch(state, name, CrudKind::Index, HashMap::new(), query, headers, None).await
            }
        };
        let store_name = name.clone();
        let store = move |State(state): State<AppState>,
                          Query(query): Query<HashMap<String, String>>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
            let name = store_name.clone();
            async move {
                dispatch(
                    state,
                    name,
                    CrudKind::Store,
                    HashMap::new(),
                    query,
                    headers,
                    Some(body),
                )
                .await
            }
        };
        let show_name = name.clone();
        let show = move |State(state): State<AppState>,
                         Path(id): Path<String>,
                         Query(query): Query<HashMap<String, String>>,
                         headers: HeaderMap| {
            let name = show_name.clone();
            async move {
                dispatch(state, name, CrudKind::Show, id_params(id), query, headers, None).await
            }
        };
        let update_name = name.clone();
        let update = move |State(state): State<AppState>,
                           Path(id): Path<String>,
                           Query(query): Query<HashMap<String, String>>,
                           headers: HeaderMap,
                           Json(body): Json<Value>| {
            let name = update_name.clone();
            async move {
                dispatch(
                    state,
                    name,
                    CrudKind::Update,
                    id_params(id),
                    query,
                    headers,
                    Some(body),
                )
                .await
            }
        };
        let delete_name = name.clone();
        let delete = move |State(state): State<AppState>,
                           Path(id): Path<String>,
                           Query(query): Query<HashMap<String, String>>,
                           headers: HeaderMap| {
            let name = delete_name.clone();
            async move {
                dispatch(state, name, CrudKind::Delete, id_params(id), query, headers, None).await
            }
        };

        router = router
            .route(&collection, get(index).post(store))
            .route(&member, get(show).patch(update).delete(delete));
    }
    router.with_state(state)
}

fn id_params(id: String) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("id".to_string(), id);
    params
}

/// Resolve the current descriptor, run the middleware chain, then the three
/// lifecycle stages.
async fn dispatch(
    state: AppState,
    entity_name: String,
    kind: CrudKind,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let (route, target): (CrudRoute, CrudTarget) = {
        let registry = read_lock(&state.cruds);
        let entry = registry
            .get(&entity_name)
            .ok_or_else(|| AppError::NotFound(entity_name.clone()))?;
        let route = entry
            .route(kind)
            .ok_or_else(|| AppError::NotFound(entity_name.clone()))?
            .clone();
        let target = CrudTarget {
            pool: state.pool.clone(),
            entity: entry.entity.clone(),
        };
        (route, target)
    };

    let chain = read_lock(&state.middlewares).chain(&route.middlewares)?;

    let mut ctx = RequestContext {
        method: route.method.clone(),
        path: route.path.clone(),
        params,
        query,
        headers,
        body,
        user: None,
    };
    for mw in chain {
        ctx = mw(ctx).await?;
    }

    let ctx = Arc::new(ctx);
    let before = (route.before)(Arc::clone(&ctx)).await?;
    let data = (route.during)(Arc::clone(&ctx), target, before).await?;
    (route.after)(ctx, data).await
}
