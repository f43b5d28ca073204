//! Named and global middlewares. A middleware receives the request context by
//! value and returns it (possibly mutated), or short-circuits with an error.
//!
//! Names are explicit and unique; registering under a taken name is an error,
//! and routes referencing an unknown name fail at registration time.

use crate::crud::types::BoxFuture;
use crate::error::{AppError, ConfigError};
use crate::request::RequestContext;
use std::collections::HashMap;
use std::sync::Arc;

pub type Middleware =
    Arc<dyn Fn(RequestContext) -> BoxFuture<Result<RequestContext, AppError>> + Send + Sync>;

/// Wrap a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(RequestContext) -> BoxFuture<Result<RequestContext, AppError>> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
pub struct MiddlewareRegistry {
    named: HashMap<String, Middleware>,
    global: Vec<Middleware>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Middleware,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.named.contains_key(&name) {
            return Err(ConfigError::MiddlewareExists(name));
        }
        self.named.insert(name, handler);
        Ok(())
    }

    /// Global middlewares run before every route, in registration order.
    pub fn register_global(&mut self, handler: Middleware) {
        self.global.push(handler);
    }

    pub fn get(&self, name: &str) -> Option<Middleware> {
        self.named.get(name).cloned()
    }

    pub fn globals(&self) -> Vec<Middleware> {
        self.global.clone()
    }

    /// Check that every name resolves; used when routes are registered or
    /// customized so bad references fail early.
    pub fn check_names(&self, names: &[String]) -> Result<(), ConfigError> {
        for name in names {
            if !self.named.contains_key(name) {
                return Err(ConfigError::MiddlewareNotFound(name.clone()));
            }
        }
        Ok(())
    }

    /// Resolve the chain for a route: globals first, then the named list.
    pub fn chain(&self, names: &[String]) -> Result<Vec<Middleware>, AppError> {
        let mut chain = self.globals();
        for name in names {
            chain.push(
                self.get(name)
                    .ok_or_else(|| ConfigError::MiddlewareNotFound(name.clone()))?,
            );
        }
        Ok(chain)
    }
}
