//! Custom-route facade: prefix groups with inherited middleware names.

use crate::crud::types::BoxFuture;
use crate::error::AppError;
use crate::request::RequestContext;
use axum::http::Method;
use axum::response::Response;
use std::sync::Arc;

pub type RouteHandler =
    Arc<dyn Fn(Arc<RequestContext>) -> BoxFuture<Result<Response, AppError>> + Send + Sync>;

/// Wrap a closure as a [`RouteHandler`].
pub fn handler<F>(f: F) -> RouteHandler
where
    F: Fn(Arc<RequestContext>) -> BoxFuture<Result<Response, AppError>> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
pub struct CustomRoute {
    pub method: Method,
    pub path: String,
    pub handler: RouteHandler,
    pub middlewares: Vec<String>,
}

/// Collects custom routes under a shared prefix and middleware-name list.
/// Mount the finished group on the server before `start()`.
#[derive(Default)]
pub struct RouteGroup {
    prefix: String,
    middlewares: Vec<String>,
    routes: Vec<CustomRoute>,
}

impl RouteGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str, middlewares: &[&str]) -> Self {
        RouteGroup {
            prefix: normalize_path(prefix),
            middlewares: middlewares.iter().map(|s| s.to_string()).collect(),
            routes: Vec::new(),
        }
    }

    /// Nested group: the child's prefix and middleware names extend this
    /// group's, and its routes land in this group.
    pub fn group(&mut self, prefix: &str, middlewares: &[&str], build: impl FnOnce(&mut RouteGroup)) {
        let mut names = self.middlewares.clone();
        names.extend(middlewares.iter().map(|s| s.to_string()));
        let mut child = RouteGroup {
            prefix: normalize_path(&format!("{}/{}", self.prefix, prefix)),
            middlewares: names,
            routes: Vec::new(),
        };
        build(&mut child);
        self.routes.extend(child.routes);
    }

    pub fn get(&mut self, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        self.add(Method::GET, path, handler, middlewares);
    }

    pub fn post(&mut self, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        self.add(Method::POST, path, handler, middlewares);
    }

    pub fn put(&mut self, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        self.add(Method::PUT, path, handler, middlewares);
    }

    pub fn patch(&mut self, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        self.add(Method::PATCH, path, handler, middlewares);
    }

    pub fn delete(&mut self, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        self.add(Method::DELETE, path, handler, middlewares);
    }

    fn add(&mut self, method: Method, path: &str, handler: RouteHandler, middlewares: &[&str]) {
        let mut names = self.middlewares.clone();
        names.extend(middlewares.iter().map(|s| s.to_string()));
        self.routes.push(CustomRoute {
            method,
            path: normalize_path(&format!("{}/{}", self.prefix, path)),
            handler,
            middlewares: names,
        });
    }

    pub fn into_routes(self) -> Vec<CustomRoute> {
        self.routes
    }
}

/// Leading slash enforced, duplicate slashes collapsed, trailing slash
/// stripped (axum treats "/a/" and "/a" as distinct routes).
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut prev_slash = true;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
