//! Default lifecycle hooks for the five generated operations.

use crate::crud::types::{BeforeHook, BoxFuture, CrudKind, CrudRoute, CrudTarget};
use crate::error::AppError;
use crate::request::RequestContext;
use crate::response;
use crate::service::{CrudService, RequestValidator};
use axum::http::Method;
use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Build the five default routes for an entity. `prefix` becomes a leading
/// path segment (API versioning); `middlewares` is shared by all five.
pub fn base_routes(
    entity: &crate::entity::Entity,
    prefix: Option<&str>,
    middlewares: &[String],
) -> (String, HashMap<CrudKind, CrudRoute>) {
    let collection = match prefix {
        Some(p) => format!("/{}/{}", p.trim_matches('/'), entity.path_segment),
        None => format!("/{}", entity.path_segment),
    };
    let member = format!("{}/:id", collection);

    let mut routes = HashMap::new();
    routes.insert(
        CrudKind::Index,
        CrudRoute {
            path: collection.clone(),
            method: Method::GET,
            kind: CrudKind::Index,
            before: noop_before(),
            during: Arc::new(index_during),
            after: Arc::new(many_after),
            middlewares: middlewares.to_vec(),
        },
    );
    routes.insert(
        CrudKind::Show,
        CrudRoute {
            path: member.clone(),
            method: Method::GET,
            kind: CrudKind::Show,
            before: noop_before(),
            during: Arc::new(show_during),
            after: Arc::new(one_after),
            middlewares: middlewares.to_vec(),
        },
    );
    routes.insert(
        CrudKind::Store,
        CrudRoute {
            path: collection.clone(),
            method: Method::POST,
            kind: CrudKind::Store,
            before: noop_before(),
            during: Arc::new(store_during),
            after: Arc::new(created_after),
            middlewares: middlewares.to_vec(),
        },
    );
    routes.insert(
        CrudKind::Update,
        CrudRoute {
            path: member.clone(),
            method: Method::PATCH,
            kind: CrudKind::Update,
            before: noop_before(),
            during: Arc::new(update_during),
            after: Arc::new(one_after),
            middlewares: middlewares.to_vec(),
        },
    );
    routes.insert(
        CrudKind::Delete,
        CrudRoute {
            path: member,
            method: Method::DELETE,
            kind: CrudKind::Delete,
            before: noop_before(),
            during: Arc::new(delete_during),
            after: Arc::new(one_after),
            middlewares: middlewares.to_vec(),
        },
    );
    (collection, routes)
}

fn noop_before() -> BeforeHook {
    Arc::new(|_ctx| Box::pin(async { Ok(Value::Null) }))
}

fn member_id(ctx: &RequestContext, target: &CrudTarget) -> Result<(String, Value), AppError> {
    let id_str = ctx
        .param("id")
        .ok_or_else(|| AppError::BadRequest("missing id".into()))?
        .to_string();
    let id = target.entity.parse_id(&id_str)?;
    Ok((id_str, id))
}

/// Check body keys against declared columns; an undeclared column is a
/// validation error (entities without declared columns accept any keys).
fn check_columns(
    body: &HashMap<String, Value>,
    entity: &crate::entity::Entity,
) -> Result<(), AppError> {
    if entity.columns.is_empty() {
        return Ok(());
    }
    for key in body.keys() {
        if !entity.has_column(key) {
            return Err(AppError::Validation(format!("unknown column '{}'", key)));
        }
    }
    Ok(())
}

fn index_during(
    ctx: Arc<RequestContext>,
    target: CrudTarget,
    _before: Value,
) -> BoxFuture<Result<Value, AppError>> {
    Box::pin(async move {
        let mut limit: Option<u32> = None;
        let mut offset: Option<u32> = None;
        let mut filters: Vec<(String, Value)> = Vec::new();
        for (k, v) in &ctx.query {
            match k.as_str() {
                "limit" => limit = v.parse().ok(),
                "offset" => offset = v.parse().ok(),
                _ => {
                    if target.entity.has_column(k) {
                        filters.push((k.clone(), target.entity.coerce_query_value(k, v)));
                    }
                }
            }
        }
        let mut rows =
            CrudService::list(target.pool()?, &target.entity, &filters, limit, offset).await?;
        for row in &mut rows {
            target.entity.strip_sensitive(row);
        }
        Ok(Value::Array(rows))
    })
}

fn show_during(
    ctx: Arc<RequestContext>,
    target: CrudTarget,
    _before: Value,
) -> BoxFuture<Result<Value, AppError>> {
    Box::pin(async move {
        let (id_str, id) = member_id(&ctx, &target)?;
        let mut row = CrudService::read(target.pool()?, &target.entity, &id)
            .await?
            .ok_or(AppError::NotFound(id_str))?;
        target.entity.strip_sensitive(&mut row);
        Ok(row)
    })
}

fn store_during(
    ctx: Arc<RequestContext>,
    target: CrudTarget,
    _before: Value,
) -> BoxFuture<Result<Value, AppError>> {
    Box::pin(async move {
        let body = ctx.body_object()?;
        check_columns(&body, &target.entity)?;
        RequestValidator::validate(&body, &target.entity.validation)?;
        let mut row = CrudService::create(target.pool()?, &target.entity, &body).await?;
        target.entity.strip_sensitive(&mut row);
        Ok(row)
    })
}

fn update_during(
    ctx: Arc<RequestContext>,
    target: CrudTarget,
    _before: Value,
) -> BoxFuture<Result<Value, AppError>> {
    Box::pin(async move {
        let (id_str, id) = member_id(&ctx, &target)?;
        let body = ctx.body_object()?;
        check_columns(&body, &target.entity)?;
        RequestValidator::validate_partial(&body, &target.entity.validation)?;
        let mut row = CrudService::update(target.pool()?, &target.entity, &id, &body)
            .await?
            .ok_or(AppError::NotFound(id_str))?;
        target.entity.strip_sensitive(&mut row);
        Ok(row)
    })
}

fn delete_during(
    ctx: Arc<RequestContext>,
    target: CrudTarget,
    _before: Value,
) -> BoxFuture<Result<Value, AppError>> {
    Box::pin(async move {
        let (id_str, id) = member_id(&ctx, &target)?;
        let mut row = CrudService::delete(target.pool()?, &target.entity, &id)
            .await?
            .ok_or(AppError::NotFound(id_str))?;
        target.entity.strip_sensitive(&mut row);
        Ok(row)
    })
}

fn many_after(_ctx: Arc<RequestContext>, data: Value) -> BoxFuture<Result<Response, AppError>> {
    Box::pin(async move {
        Ok(match data {
            Value::Array(rows) => response::ok_many(rows),
            other => response::ok(other),
        })
    })
}

fn one_after(_ctx: Arc<RequestContext>, data: Value) -> BoxFuture<Result<Response, AppError>> {
    Box::pin(async move { Ok(response::ok(data)) })
}

fn created_after(_ctx: Arc<RequestContext>, data: Value) -> BoxFuture<Result<Response, AppError>> {
    Box::pin(async move { Ok(response::created(data)) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[test]
    fn five_routes_with_expected_paths_and_methods() {
        let entity = Entity::new("User", "users");
        let (collection, routes) = base_routes(&entity, None, &[]);
        assert_eq!(collection, "/users");
        assert_eq!(routes.len(), 5);
        assert_eq!(routes[&CrudKind::Index].path, "/users");
        assert_eq!(routes[&CrudKind::Index].method, Method::GET);
        assert_eq!(routes[&CrudKind::Show].path, "/users/:id");
        assert_eq!(routes[&CrudKind::Store].method, Method::POST);
        assert_eq!(routes[&CrudKind::Update].method, Method::PATCH);
        assert_eq!(routes[&CrudKind::Delete].method, Method::DELETE);
    }

    #[test]
    fn api_version_prefixes_the_collection() {
        let entity = Entity::new("User", "users");
        let (collection, routes) = base_routes(&entity, Some("v2"), &[]);
        assert_eq!(collection, "/v2/users");
        assert_eq!(routes[&CrudKind::Show].path, "/v2/users/:id");
    }

    #[test]
    fn shared_middlewares_reach_every_route() {
        let entity = Entity::new("User", "users");
        let names = vec!["auth".to_string()];
        let (_, routes) = base_routes(&entity, None, &names);
        for kind in CrudKind::ALL {
            assert_eq!(routes[&kind].middlewares, names);
        }
    }
}
