//! Example consumer: a User entity with generated CRUD, a customized index
//! route, a global middleware, and a cron job.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Expects `DB_*` (or `DATABASE_URL`) and `REDIS_*` in the environment.

use gantry_sdk::{
    Entity, HookOverride, PkType, Server, ServerOptions, ServiceOptions, StartupHooks,
    ValidationRule,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gantry_sdk::init_logging("gantry_sdk=info,example_consumer=info");

    let user = Entity::new("User", "users")
        .pk("id", PkType::BigInt)
        .column("id")
        .column("name")
        .typed_column("email", "text")
        .typed_column("active", "bool")
        .column("password")
        .sensitive("password")
        .validate("email", ValidationRule::new().required().format("email"))
        .validate("name", ValidationRule::new().length(1, 120));

    let mut server = Server::create(ServerOptions {
        services: ServiceOptions {
            sql: true,
            redis: true,
            ..Default::default()
        },
        on_service_startup: StartupHooks::default()
            .on_sql(|| tracing::info!("SQL connected"))
            .on_redis(|| tracing::info!("Redis connected")),
        ..Default::default()
    })
    .await?;

    server.register_global_middleware(gantry_sdk::middleware(|ctx| {
        Box::pin(async move {
            tracing::debug!(path = %ctx.path, "request");
            Ok(ctx)
        })
    }));

    server.make_crud(&user);

    // Hide inactive users from the listing without touching the other routes.
    server.customize_index(
        &user,
        HookOverride::new().during(|ctx, target, _before| {
            Box::pin(async move {
                let rows = gantry_sdk::CrudService::list(
                    target.pool()?,
                    &target.entity,
                    &[("active".to_string(), serde_json::json!(true))],
                    ctx.query_param("limit").and_then(|v| v.parse().ok()),
                    ctx.query_param("offset").and_then(|v| v.parse().ok()),
                )
                .await?;
                let mut rows = rows;
                for row in &mut rows {
                    target.entity.strip_sensitive(row);
                }
                Ok(serde_json::Value::Array(rows))
            })
        }),
    )?;

    server.route(
        gantry_sdk::Method::GET,
        "/ping",
        gantry_sdk::handler(|_ctx| {
            Box::pin(async { Ok(gantry_sdk::response::ok("pong")) })
        }),
        &[],
    )?;

    gantry_sdk::schedule("0 3 * * *", Some(Duration::from_secs(60)), || async {
        tracing::info!("nightly maintenance tick");
    })?;

    let port = server.port;
    server
        .start_with(move || tracing::info!("Server started on port {}", port))
        .await?;
    Ok(())
}
