//! Request context handed to middlewares and lifecycle hooks.

use crate::error::AppError;
use axum::http::{header, HeaderMap, Method};
use serde_json::Value;
use std::collections::HashMap;

/// A decoded view of the incoming request. Middlewares receive it by value
/// and may mutate it (notably [`RequestContext::user`]); hooks receive it
/// behind an `Arc` once the middleware chain has run.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Path parameters, e.g. `id` on member routes.
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    /// JSON body for store/update requests.
    pub body: Option<Value>,
    /// Authenticated user row, attached by the auth middleware.
    pub user: Option<Value>,
}

impl RequestContext {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    /// The body as a JSON object map; errors when absent or not an object.
    pub fn body_object(&self) -> Result<HashMap<String, Value>, AppError> {
        match &self.body {
            Some(Value::Object(m)) => Ok(m.clone().into_iter().collect()),
            Some(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
            None => Err(AppError::BadRequest("request body is required".into())),
        }
    }

    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        let mut ctx = RequestContext::default();
        assert_eq!(ctx.bearer_token(), None);

        ctx.headers
            .insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(ctx.bearer_token(), Some("abc.def.ghi"));

        ctx.headers
            .insert(header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert_eq!(ctx.bearer_token(), None);
    }

    #[test]
    fn body_object_rejects_non_objects() {
        let mut ctx = RequestContext::default();
        assert!(ctx.body_object().is_err());

        ctx.body = Some(json!([1, 2]));
        assert!(ctx.body_object().is_err());

        ctx.body = Some(json!({"a": 1}));
        assert_eq!(ctx.body_object().unwrap().get("a"), Some(&json!(1)));
    }
}
