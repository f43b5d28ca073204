//! In-process router tests: no services enabled, so generated routes are
//! exercised through hook overrides and canned data.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use gantry_sdk::{
    middleware, Entity, HookOverride, Method, Server, ServerOptions, ValidationRule,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn blank_server() -> Server {
    Server::create(ServerOptions::default())
        .await
        .expect("no services enabled, create cannot fail")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_and_version_respond() {
    let server = blank_server().await;
    let app = server.build_router();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));

    let response = app.oneshot(get("/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], json!("gantry-sdk"));
}

#[tokio::test]
async fn ready_reports_ok_without_sql_service() {
    let server = blank_server().await;
    let response = server
        .build_router()
        .oneshot(get("/ready"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert!(body.get("database").is_none());
}

#[tokio::test]
async fn generated_index_route_uses_overridden_during_stage() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    server.make_crud(&user);
    server
        .customize_index(
            &user,
            HookOverride::new().during(|_ctx, _target, _before| {
                Box::pin(async {
                    Ok(json!([
                        {"id": 1, "name": "ada"},
                        {"id": 2, "name": "grace"}
                    ]))
                })
            }),
        )
        .unwrap();

    let response = server
        .build_router()
        .oneshot(get("/users"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["count"], json!(2));
    assert_eq!(body["data"][0]["name"], json!("ada"));
}

#[tokio::test]
async fn default_during_without_sql_service_is_503() {
    let server = blank_server().await;
    server.make_crud(&Entity::new("User", "users"));

    let response = server
        .build_router()
        .oneshot(get("/users"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("service_unavailable"));
}

#[tokio::test]
async fn malformed_member_id_is_rejected_before_persistence() {
    let server = blank_server().await;
    server.make_crud(&Entity::new("User", "users"));

    let response = server
        .build_router()
        .oneshot(get("/users/not-a-number"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_validation_runs_before_persistence() {
    let server = blank_server().await;
    let user = Entity::new("User", "users")
        .column("id")
        .column("email")
        .validate("email", ValidationRule::new().required().format("email"));
    server.make_crud(&user);

    // Missing required email fails validation without touching the pool.
    let response = server
        .build_router()
        .oneshot(post_json("/users", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Undeclared column is rejected the same way.
    let response = server
        .build_router()
        .oneshot(post_json(
            "/users",
            json!({"email": "a@b.co", "nope": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn named_middleware_can_reject_a_route() {
    let server = blank_server().await;
    server
        .register_middleware(
            "deny",
            middleware(|_ctx| {
                Box::pin(async {
                    Err(gantry_sdk::AppError::Unauthorized("denied".into()))
                })
            }),
        )
        .unwrap();

    let user = Entity::new("User", "users");
    server.make_crud(&user);
    server
        .customize_index(
            &user,
            HookOverride::new()
                .during(|_ctx, _target, _before| Box::pin(async { Ok(json!([])) }))
                .middlewares(["deny"]),
        )
        .unwrap();

    let app = server.build_router();
    let response = app.clone().oneshot(get("/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Other routes for the same entity keep their empty middleware list.
    let response = app.oneshot(get("/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn referencing_an_unknown_middleware_fails_registration() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    let err = server
        .make_crud_with(&user, &["ghost"], None)
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));

    server.make_crud(&user);
    let err = server
        .customize_show(&user, HookOverride::new().middlewares(["ghost"]))
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn customization_hot_swaps_behavior_on_a_built_router() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    server.make_crud(&user);
    server
        .customize_index(
            &user,
            HookOverride::new()
                .during(|_ctx, _target, _before| Box::pin(async { Ok(json!([{"v": 1}])) })),
        )
        .unwrap();

    let app = server.build_router();
    let body = body_json(app.clone().oneshot(get("/users")).await.unwrap()).await;
    assert_eq!(body["data"][0]["v"], json!(1));

    // Swap the during stage after the router was built; last write wins and
    // the running app picks it up through the shared registry.
    server
        .customize_index(
            &user,
            HookOverride::new()
                .during(|_ctx, _target, _before| Box::pin(async { Ok(json!([{"v": 2}])) })),
        )
        .unwrap();

    let body = body_json(app.oneshot(get("/users")).await.unwrap()).await;
    assert_eq!(body["data"][0]["v"], json!(2));
}

#[tokio::test]
async fn custom_after_stage_controls_the_response() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    server.make_crud(&user);
    server
        .customize_index(
            &user,
            HookOverride::new()
                .during(|_ctx, _target, _before| Box::pin(async { Ok(json!([])) }))
                .after(|_ctx, _data| {
                    Box::pin(async {
                        Ok(gantry_sdk::response::internal_server_error(
                            "something went wrong",
                        ))
                    })
                }),
        )
        .unwrap();

    let response = server
        .build_router()
        .oneshot(get("/users"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn before_stage_output_reaches_during() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    server.make_crud(&user);
    server
        .customize_show(
            &user,
            HookOverride::new()
                .before(|_ctx| Box::pin(async { Ok(json!("from-before")) }))
                .during(|ctx, _target, before| {
                    Box::pin(async move {
                        Ok(json!({
                            "id": ctx.param("id"),
                            "carried": before,
                        }))
                    })
                }),
        )
        .unwrap();

    let body = body_json(
        server
            .build_router()
            .oneshot(get("/users/7"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["carried"], json!("from-before"));
    assert_eq!(body["data"]["id"], json!("7"));
}

#[tokio::test]
async fn global_middleware_runs_for_custom_routes() {
    let mut server = blank_server().await;
    server.register_global_middleware(middleware(|mut ctx| {
        Box::pin(async move {
            ctx.user = Some(json!({"id": 0, "name": "system"}));
            Ok(ctx)
        })
    }));
    server
        .route(
            Method::GET,
            "/whoami",
            gantry_sdk::handler(|ctx| {
                Box::pin(async move {
                    let user = ctx.user().cloned().unwrap_or(Value::Null);
                    Ok(gantry_sdk::response::ok(user))
                })
            }),
            &[],
        )
        .unwrap();

    let body = body_json(
        server
            .build_router()
            .oneshot(get("/whoami"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["name"], json!("system"));
}

#[tokio::test]
async fn api_version_prefix_moves_the_generated_paths() {
    let server = blank_server().await;
    let user = Entity::new("User", "users");
    server.make_crud_with(&user, &[], Some("v1")).unwrap();
    server
        .customize_index(
            &user,
            HookOverride::new()
                .during(|_ctx, _target, _before| Box::pin(async { Ok(json!([])) })),
        )
        .unwrap();

    let app = server.build_router();
    let response = app.clone().oneshot(get("/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
