//! Shared application state for all routes. Registries are behind locks so
//! customization after startup hot-swaps the hooks live requests resolve.

use crate::auth::AuthService;
use crate::crud::CrudRegistry;
use crate::mailer::Mailer;
use crate::middleware::MiddlewareRegistry;
use sqlx::PgPool;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub pool: Option<PgPool>,
    pub cruds: Arc<RwLock<CrudRegistry>>,
    pub middlewares: Arc<RwLock<MiddlewareRegistry>>,
    pub auth: Option<Arc<AuthService>>,
    pub mailer: Option<Arc<Mailer>>,
    pub redis: Option<redis::aio::ConnectionManager>,
    pub mongo: Option<mongodb::Client>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            pool: None,
            cruds: Arc::new(RwLock::new(CrudRegistry::new())),
            middlewares: Arc::new(RwLock::new(MiddlewareRegistry::new())),
            auth: None,
            mailer: None,
            redis: None,
            mongo: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry reads never poison-panic; a poisoned lock yields its inner guard.
pub(crate) fn read_lock<T>(lock: &Arc<RwLock<T>>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write_lock<T>(lock: &Arc<RwLock<T>>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
