//! Gantry SDK: convention-driven web backend library.
//!
//! Wires an axum server to PostgreSQL, redis, mongo, and SMTP as optional
//! services, then generates CRUD routes for declared entities with
//! before/during/after lifecycle hooks that can be overridden per entity.

pub mod auth;
pub mod config;
pub mod cron;
pub mod crud;
pub mod entity;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;
pub mod service;
pub mod services;
pub mod sql;
pub mod state;

pub use auth::{AuthService, Claims, TokenManager, TokenPair};
pub use axum::http::Method;
pub use config::{load_env_files, TokenSettings};
pub use cron::{schedule, Schedule};
pub use crud::{BoxFuture, CrudKind, CrudTarget, HookOverride};
pub use entity::{Entity, PkType};
pub use error::{AppError, ConfigError};
pub use logging::init_logging;
pub use mailer::Mailer;
pub use middleware::{middleware, Middleware};
pub use request::RequestContext;
pub use router::{handler, RouteGroup, RouteHandler};
pub use server::{Server, ServerOptions};
pub use service::{CrudService, ValidationRule};
pub use services::{AuthOptions, ServiceOptions, StartupHooks};
pub use state::AppState;
