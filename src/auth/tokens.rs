//! Access/refresh token signing and verification (HS256).

use crate::config::TokenSettings;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User primary key; kept as JSON so numeric and uuid keys both work.
    pub id: Value,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenManager {
    settings: TokenSettings,
}

impl TokenManager {
    pub fn new(settings: TokenSettings) -> Self {
        TokenManager { settings }
    }

    pub fn generate_access_token(&self, id: &Value) -> Result<String, AppError> {
        self.generate(
            id,
            &self.settings.access_secret,
            self.settings.access_expires_in,
        )
    }

    pub fn generate_refresh_token(&self, id: &Value) -> Result<String, AppError> {
        self.generate(
            id,
            &self.settings.refresh_secret,
            self.settings.refresh_expires_in,
        )
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        Self::verify(token, &self.settings.access_secret)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        Self::verify(token, &self.settings.refresh_secret)
    }

    fn generate(&self, id: &Value, secret: &str, expires_in: i64) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            id: id.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expires_in,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> TokenManager {
        TokenManager::new(TokenSettings {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_expires_in: 900,
            refresh_expires_in: 86_400,
        })
    }

    #[test]
    fn access_token_round_trips_claims() {
        let manager = manager();
        let token = manager.generate_access_token(&json!(42)).unwrap();
        let claims = manager.verify_access_token(&token).unwrap();
        assert_eq!(claims.id, json!(42));
        assert!(!claims.jti.is_empty());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_are_not_interchangeable_across_secrets() {
        let manager = manager();
        let refresh = manager.generate_refresh_token(&json!("u1")).unwrap();
        assert!(manager.verify_access_token(&refresh).is_err());
        assert!(manager.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let manager = TokenManager::new(TokenSettings {
            access_secret: "s".into(),
            refresh_secret: "r".into(),
            // Past the default 60s decode leeway.
            access_expires_in: -120,
            refresh_expires_in: -120,
        });
        let token = manager.generate_access_token(&json!(1)).unwrap();
        assert!(manager.verify_access_token(&token).is_err());
    }

    #[test]
    fn each_token_gets_a_fresh_jti() {
        let manager = manager();
        let a = manager.generate_access_token(&json!(1)).unwrap();
        let b = manager.generate_access_token(&json!(1)).unwrap();
        let ca = manager.verify_access_token(&a).unwrap();
        let cb = manager.verify_access_token(&b).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }
}
