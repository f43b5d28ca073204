//! Startup wiring: connect each enabled service from env settings and fire
//! its startup hook.

use crate::auth::AuthService;
use crate::config;
use crate::entity::Entity;
use crate::error::{AppError, ConfigError};
use crate::mailer::Mailer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

/// Which services to bring up at [`crate::server::Server::create`] time.
#[derive(Default)]
pub struct ServiceOptions {
    pub sql: bool,
    pub redis: bool,
    pub mongo: bool,
    pub smtp: bool,
    /// Enables the auth service and routes; requires `sql`.
    pub auth: Option<AuthOptions>,
}

pub struct AuthOptions {
    /// Entity backing auth users; must expose `email` and `password` columns.
    pub user_entity: Entity,
}

type StartupHook = Box<dyn Fn() + Send + Sync>;

/// Callbacks fired after each service connects.
#[derive(Default)]
pub struct StartupHooks {
    pub sql: Option<StartupHook>,
    pub redis: Option<StartupHook>,
    pub mongo: Option<StartupHook>,
    pub smtp: Option<StartupHook>,
}

impl StartupHooks {
    pub fn on_sql(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.sql = Some(Box::new(hook));
        self
    }

    pub fn on_redis(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.redis = Some(Box::new(hook));
        self
    }

    pub fn on_mongo(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.mongo = Some(Box::new(hook));
        self
    }

    pub fn on_smtp(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.smtp = Some(Box::new(hook));
        self
    }
}

/// Connected service handles, in the shape [`crate::state::AppState`] carries.
pub struct ConnectedServices {
    pub pool: Option<PgPool>,
    pub redis: Option<redis::aio::ConnectionManager>,
    pub mongo: Option<mongodb::Client>,
    pub mailer: Option<Arc<Mailer>>,
    pub auth: Option<Arc<AuthService>>,
}

pub async fn connect_services(
    options: &ServiceOptions,
    hooks: &StartupHooks,
) -> Result<ConnectedServices, AppError> {
    let mut pool = None;
    let mut redis_conn = None;
    let mut mongo_client = None;
    let mut mailer = None;
    let mut auth = None;

    if options.sql {
        let settings =
            config::sql_from_env().ok_or(ConfigError::MissingService("sql"))?;
        let connected = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.connection_url())
            .await
            .map_err(|e| ConfigError::Connect("sql", e.to_string()))?;
        tracing::info!("sql connected");
        if let Some(hook) = &hooks.sql {
            hook();
        }
        pool = Some(connected);
    }

    if options.redis {
        let settings =
            config::redis_from_env().ok_or(ConfigError::MissingService("redis"))?;
        let client = redis::Client::open(settings.connection_url())
            .map_err(|e| ConfigError::Connect("redis", e.to_string()))?;
        let manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| ConfigError::Connect("redis", e.to_string()))?;
        tracing::info!("redis connected");
        if let Some(hook) = &hooks.redis {
            hook();
        }
        redis_conn = Some(manager);
    }

    if options.mongo {
        let settings =
            config::mongo_from_env().ok_or(ConfigError::MissingService("mongo"))?;
        let client = mongodb::Client::with_uri_str(&settings.uri)
            .await
            .map_err(|e| ConfigError::Connect("mongo", e.to_string()))?;
        tracing::info!("mongo connected");
        if let Some(hook) = &hooks.mongo {
            hook();
        }
        mongo_client = Some(client);
    }

    if options.smtp {
        let settings =
            config::smtp_from_env().ok_or(ConfigError::MissingService("smtp"))?;
        let transport = Mailer::from_settings(&settings)?;
        tracing::info!("smtp transport ready");
        if let Some(hook) = &hooks.smtp {
            hook();
        }
        mailer = Some(Arc::new(transport));
    }

    if let Some(auth_options) = &options.auth {
        let settings =
            config::tokens_from_env().ok_or(ConfigError::MissingService("auth"))?;
        let pool = pool
            .clone()
            .ok_or(ConfigError::MissingService("auth requires sql"))?;
        auth = Some(Arc::new(AuthService::new(
            settings,
            auth_options.user_entity.clone(),
            pool,
        )));
        tracing::info!("auth service ready");
    }

    Ok(ConnectedServices {
        pool,
        redis: redis_conn,
        mongo: mongo_client,
        mailer,
        auth,
    })
}
