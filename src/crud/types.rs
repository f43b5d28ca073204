//! CRUD route descriptors: a path + method and three composable lifecycle
//! stages (before/during/after) plus a middleware-name list.

use crate::entity::Entity;
use crate::error::AppError;
use crate::request::RequestContext;
use axum::http::Method;
use axum::response::Response;
use serde_json::Value;
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The five generated operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrudKind {
    Index,
    Show,
    Store,
    Update,
    Delete,
}

impl CrudKind {
    pub const ALL: [CrudKind; 5] = [
        CrudKind::Index,
        CrudKind::Show,
        CrudKind::Store,
        CrudKind::Update,
        CrudKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudKind::Index => "index",
            CrudKind::Show => "show",
            CrudKind::Store => "store",
            CrudKind::Update => "update",
            CrudKind::Delete => "delete",
        }
    }
}

/// Persistence handle given to `during` hooks: the pool (when the SQL service
/// is enabled) and the entity descriptor the route was generated for.
#[derive(Clone)]
pub struct CrudTarget {
    pub pool: Option<PgPool>,
    pub entity: Entity,
}

impl CrudTarget {
    pub fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool.as_ref().ok_or(AppError::ServiceNotEnabled("sql"))
    }
}

/// Runs before the persistence stage; its output is handed to `during`.
pub type BeforeHook =
    Arc<dyn Fn(Arc<RequestContext>) -> BoxFuture<Result<Value, AppError>> + Send + Sync>;

/// The persistence stage. Receives the request, the target, and the `before`
/// output; returns the fetched/created/updated/deleted data.
pub type DuringHook = Arc<
    dyn Fn(Arc<RequestContext>, CrudTarget, Value) -> BoxFuture<Result<Value, AppError>>
        + Send
        + Sync,
>;

/// Turns the `during` output into the HTTP response. Custom hooks may return
/// any status.
pub type AfterHook =
    Arc<dyn Fn(Arc<RequestContext>, Value) -> BoxFuture<Result<Response, AppError>> + Send + Sync>;

#[derive(Clone)]
pub struct CrudRoute {
    pub path: String,
    pub method: Method,
    pub kind: CrudKind,
    pub before: BeforeHook,
    pub during: DuringHook,
    pub after: AfterHook,
    pub middlewares: Vec<String>,
}

/// Partial replacement for one route's stages. Unset stages keep the current
/// hook; a non-empty middleware list replaces the current list.
#[derive(Clone, Default)]
pub struct HookOverride {
    pub before: Option<BeforeHook>,
    pub during: Option<DuringHook>,
    pub after: Option<AfterHook>,
    pub middlewares: Vec<String>,
}

impl HookOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(Arc<RequestContext>) -> BoxFuture<Result<Value, AppError>> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    pub fn during<F>(mut self, f: F) -> Self
    where
        F: Fn(Arc<RequestContext>, CrudTarget, Value) -> BoxFuture<Result<Value, AppError>>
            + Send
            + Sync
            + 'static,
    {
        self.during = Some(Arc::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Value) -> BoxFuture<Result<Response, AppError>>
            + Send
            + Sync
            + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    pub fn middlewares<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middlewares = names.into_iter().map(Into::into).collect();
        self
    }
}
