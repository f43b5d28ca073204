//! Token-based authentication over a user entity.
//!
//! The user entity must expose `email` and `password` columns and may expose
//! an `active` boolean; its primary key identifies token subjects.

pub mod tokens;

pub use tokens::{Claims, TokenManager};

use crate::config::TokenSettings;
use crate::entity::Entity;
use crate::error::AppError;
use crate::middleware::{middleware, Middleware};
use crate::service::CrudService;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    tokens: TokenManager,
    user_entity: Entity,
    pool: PgPool,
}

impl AuthService {
    pub fn new(settings: TokenSettings, user_entity: Entity, pool: PgPool) -> Self {
        AuthService {
            tokens: TokenManager::new(settings),
            user_entity,
            pool,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn user_entity(&self) -> &Entity {
        &self.user_entity
    }

    /// Create a user with a hashed password. The body must carry `email` and
    /// `password`; an existing email is a conflict. Returns the created row
    /// without the password.
    pub async fn register(&self, body: HashMap<String, Value>) -> Result<Value, AppError> {
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Validation("user must have an email field".into()))?
            .to_string();
        let password = body
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Validation("user must have a password field".into()))?
            .to_string();

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("user already exists".into()));
        }

        let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let mut body = body;
        body.insert("password".to_string(), Value::String(hashed));

        let mut row = CrudService::create(&self.pool, &self.user_entity, &body).await?;
        if let Value::Object(map) = &mut row {
            map.remove("password");
        }
        self.user_entity.strip_sensitive(&mut row);
        Ok(row)
    }

    /// Verify credentials and issue a token pair. Unknown email is 404, a bad
    /// password 401, an inactive user 403.
    pub async fn attempt_login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;
        let hash = user
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Internal("user row has no password column".into()))?;
        if !bcrypt::verify(password, hash)? {
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }
        if user.get("active").and_then(Value::as_bool) == Some(false) {
            return Err(AppError::Forbidden("user is not active".into()));
        }
        let id = user
            .get(&self.user_entity.pk_column)
            .cloned()
            .unwrap_or(Value::Null);
        Ok(TokenPair {
            access_token: self.tokens.generate_access_token(&id)?,
            refresh_token: self.tokens.generate_refresh_token(&id)?,
        })
    }

    /// Exchange a valid refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;
        self.find_user_by_id(&claims.id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;
        self.tokens.generate_access_token(&claims.id)
    }

    pub async fn find_user_by_id(&self, id: &Value) -> Result<Option<Value>, AppError> {
        CrudService::read(&self.pool, &self.user_entity, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Value>, AppError> {
        let filters = [("email".to_string(), Value::String(email.to_string()))];
        let rows =
            CrudService::list(&self.pool, &self.user_entity, &filters, Some(1), None).await?;
        Ok(rows.into_iter().next())
    }
}

/// Middleware verifying the bearer token and attaching the user row to the
/// request context. Registered under the name `auth` when the auth service is
/// enabled.
pub fn auth_middleware(auth: Arc<AuthService>) -> Middleware {
    middleware(move |mut ctx| {
        let auth = Arc::clone(&auth);
        Box::pin(async move {
            let token = ctx
                .bearer_token()
                .ok_or_else(|| {
                    AppError::Unauthorized("no token provided in Authorization header".into())
                })?
                .to_string();
            let claims = auth.tokens().verify_access_token(&token)?;
            let mut user = auth
                .find_user_by_id(&claims.id)
                .await?
                .ok_or_else(|| AppError::NotFound("user".into()))?;
            auth.user_entity().strip_sensitive(&mut user);
            ctx.user = Some(user);
            Ok(ctx)
        })
    })
}
