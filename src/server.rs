//! Server bootstrap facade: wires enabled services, owns the CRUD and
//! middleware registries, and assembles the axum app.

use crate::auth::{auth_middleware, AuthService};
use crate::config;
use crate::crud::{CrudKind, EntityCruds, HookOverride};
use crate::entity::Entity;
use crate::error::AppError;
use crate::mailer::Mailer;
use crate::middleware::Middleware;
use crate::router::{CustomRoute, RouteGroup, RouteHandler};
use crate::routes;
use crate::services::{connect_services, ServiceOptions, StartupHooks};
use crate::state::{read_lock, write_lock, AppState};
use axum::http::Method;
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Default)]
pub struct ServerOptions {
    /// Falls back to `PORT`, then 80.
    pub port: Option<u16>,
    /// Falls back to `HOST`, then "0.0.0.0".
    pub host: Option<String>,
    pub services: ServiceOptions,
    pub on_service_startup: StartupHooks,
}

pub struct Server {
    pub port: u16,
    pub host: String,
    state: AppState,
    custom_routes: Vec<CustomRoute>,
    cors: Option<CorsLayer>,
}

impl Server {
    /// Main entry point: load the env-file hierarchy, connect the enabled
    /// services (firing their startup hooks), and return the server. Port and
    /// host fall back to `PORT`/`HOST`, then 80 / 0.0.0.0.
    pub async fn create(options: ServerOptions) -> Result<Server, AppError> {
        config::load_env_files();
        let connected = connect_services(&options.services, &options.on_service_startup).await?;

        let mut state = AppState::new();
        state.pool = connected.pool;
        state.redis = connected.redis;
        state.mongo = connected.mongo;
        state.mailer = connected.mailer;
        state.auth = connected.auth;

        if let Some(auth) = &state.auth {
            write_lock(&state.middlewares)
                .register("auth", auth_middleware(Arc::clone(auth)))
                .map_err(AppError::Config)?;
        }

        Ok(Server {
            port: options.port.unwrap_or_else(config::server_port),
            host: options.host.unwrap_or_else(config::server_host),
            state,
            custom_routes: Vec::new(),
            cors: None,
        })
    }

    pub fn sql(&self) -> Result<&PgPool, AppError> {
        self.state.pool.as_ref().ok_or(AppError::ServiceNotEnabled("sql"))
    }

    pub fn redis(&self) -> Result<redis::aio::ConnectionManager, AppError> {
        self.state
            .redis
            .clone()
            .ok_or(AppError::ServiceNotEnabled("redis"))
    }

    pub fn mongo(&self) -> Result<mongodb::Client, AppError> {
        self.state
            .mongo
            .clone()
            .ok_or(AppError::ServiceNotEnabled("mongo"))
    }

    pub fn mailer(&self) -> Result<Arc<Mailer>, AppError> {
        self.state
            .mailer
            .clone()
            .ok_or(AppError::ServiceNotEnabled("smtp"))
    }

    pub fn auth(&self) -> Result<Arc<AuthService>, AppError> {
        self.state
            .auth
            .clone()
            .ok_or(AppError::ServiceNotEnabled("auth"))
    }

    /// Shared state handle; registries stay live after `start()`.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Runs before every generated and custom route, in registration order.
    pub fn register_global_middleware(&self, handler: Middleware) {
        write_lock(&self.state.middlewares).register_global(handler);
    }

    /// Register a middleware under an explicit unique name for CRUD and
    /// custom routes to reference. A taken name is an error.
    pub fn register_middleware(
        &self,
        name: impl Into<String>,
        handler: Middleware,
    ) -> Result<(), AppError> {
        write_lock(&self.state.middlewares)
            .register(name, handler)
            .map_err(AppError::Config)
    }

    /// Generate the five CRUD routes for an entity. Re-registering an entity
    /// replaces its routes (last write wins). Must run before `start()`.
    pub fn make_crud(&self, entity: &Entity) {
        write_lock(&self.state.cruds).insert(EntityCruds::generate(entity.clone(), None, &[]));
    }

    /// `make_crud` with a shared middleware-name list and an optional API
    /// version prefix (e.g. "v1" mounts at /v1/users).
    pub fn make_crud_with(
        &self,
        entity: &Entity,
        middlewares: &[&str],
        api_version: Option<&str>,
    ) -> Result<(), AppError> {
        let names: Vec<String> = middlewares.iter().map(|s| s.to_string()).collect();
        read_lock(&self.state.middlewares)
            .check_names(&names)
            .map_err(AppError::Config)?;
        write_lock(&self.state.cruds).insert(EntityCruds::generate(
            entity.clone(),
            api_version,
            &names,
        ));
        Ok(())
    }

    pub fn customize_index(&self, entity: &Entity, edit: HookOverride) -> Result<(), AppError> {
        self.customize(entity, CrudKind::Index, edit)
    }

    pub fn customize_show(&self, entity: &Entity, edit: HookOverride) -> Result<(), AppError> {
        self.customize(entity, CrudKind::Show, edit)
    }

    pub fn customize_store(&self, entity: &Entity, edit: HookOverride) -> Result<(), AppError> {
        self.customize(entity, CrudKind::Store, edit)
    }

    pub fn customize_update(&self, entity: &Entity, edit: HookOverride) -> Result<(), AppError> {
        self.customize(entity, CrudKind::Update, edit)
    }

    pub fn customize_delete(&self, entity: &Entity, edit: HookOverride) -> Result<(), AppError> {
        self.customize(entity, CrudKind::Delete, edit)
    }

    /// Replace stages on one generated route. Works before or after
    /// `start()`: live handlers resolve hooks through the registry.
    fn customize(
        &self,
        entity: &Entity,
        kind: CrudKind,
        edit: HookOverride,
    ) -> Result<(), AppError> {
        read_lock(&self.state.middlewares)
            .check_names(&edit.middlewares)
            .map_err(AppError::Config)?;
        write_lock(&self.state.cruds)
            .customize(&entity.name, kind, edit)
            .map_err(AppError::Config)
    }

    /// Register a single custom route. Middleware names must exist.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: RouteHandler,
        middlewares: &[&str],
    ) -> Result<(), AppError> {
        let names: Vec<String> = middlewares.iter().map(|s| s.to_string()).collect();
        read_lock(&self.state.middlewares)
            .check_names(&names)
            .map_err(AppError::Config)?;
        self.custom_routes.push(CustomRoute {
            method,
            path: crate::router::normalize_path(path),
            handler,
            middlewares: names,
        });
        Ok(())
    }

    /// Mount a route group built with [`RouteGroup`].
    pub fn mount(&mut self, group: RouteGroup) -> Result<(), AppError> {
        let routes = group.into_routes();
        {
            let registry = read_lock(&self.state.middlewares);
            for route in &routes {
                registry
                    .check_names(&route.middlewares)
                    .map_err(AppError::Config)?;
            }
        }
        self.custom_routes.extend(routes);
        Ok(())
    }

    pub fn use_cors(&mut self, cors: CorsLayer) {
        self.cors = Some(cors);
    }

    /// Assemble the axum app from the current registries and custom routes.
    pub fn build_router(&self) -> Router {
        let mut app = Router::new().merge(routes::common_routes(self.state.clone()));
        if self.state.auth.is_some() {
            app = app.merge(routes::auth_routes(self.state.clone()));
        }
        app = app
            .merge(routes::crud_router(self.state.clone()))
            .merge(routes::custom_router(
                self.state.clone(),
                self.custom_routes.clone(),
            ));
        let app = app.layer(TraceLayer::new_for_http());
        match &self.cors {
            Some(cors) => app.layer(cors.clone()),
            None => app,
        }
    }

    /// Bind and serve. `on_listen` fires once the listener is bound.
    pub async fn start_with(self, on_listen: impl FnOnce()) -> Result<(), AppError> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(addr = %addr, "server listening");
        on_listen();
        let app = self.build_router();
        axum::serve(listener, app).await?;
        Ok(())
    }

    pub async fn start(self) -> Result<(), AppError> {
        self.start_with(|| {}).await
    }

    /// Spawn a cron-style job polled every minute; see [`crate::cron::schedule`]
    /// for expression semantics and a custom check interval.
    pub fn cron<F, Fut>(
        expression: &str,
        task: F,
    ) -> Result<tokio::task::JoinHandle<()>, AppError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        crate::cron::schedule(expression, None, task).map_err(AppError::Config)
    }
}
