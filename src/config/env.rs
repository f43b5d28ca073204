//! Environment loading. Each `*_from_env` returns `None` when any required
//! variable of its group is unset, so callers can tell "service not
//! configured" apart from "configured badly".

use crate::config::types::{
    MongoSettings, RedisSettings, SmtpSettings, SqlSettings, TokenSettings,
};
use std::str::FromStr;

/// Env files tried in order; an earlier file wins for a key because dotenvy
/// never overrides variables that are already set.
const ENV_FILE_HIERARCHY: &[&str] = &[
    ".env",
    ".env.local",
    ".env.development",
    ".env.production",
    ".env.test",
    ".development.env",
    ".production.env",
    ".test.env",
    ".staging.env",
];

/// Load the env-file hierarchy. Missing files are skipped silently.
pub fn load_env_files() {
    for name in ENV_FILE_HIERARCHY {
        let _ = dotenvy::from_filename(name);
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn var_parsed<T: FromStr>(key: &str) -> Option<T> {
    var(key)?.parse().ok()
}

fn var_bool(key: &str) -> Option<bool> {
    let v = var(key)?;
    match v.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub fn server_port() -> u16 {
    var_parsed("PORT").unwrap_or(80)
}

pub fn server_host() -> String {
    var("HOST").unwrap_or_else(|| "0.0.0.0".to_string())
}

pub fn sql_from_env() -> Option<SqlSettings> {
    let max_connections = var_parsed("DB_MAX_CONNECTIONS").unwrap_or(5);
    if let Some(url) = var("DATABASE_URL") {
        return Some(SqlSettings {
            host: String::new(),
            port: 5432,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            max_connections,
            url: Some(url),
        });
    }
    Some(SqlSettings {
        host: var("DB_HOST")?,
        port: var_parsed("DB_PORT")?,
        username: var("DB_USERNAME")?,
        password: var("DB_PASSWORD")?,
        database: var("DB_DATABASE")?,
        max_connections,
        url: None,
    })
}

pub fn redis_from_env() -> Option<RedisSettings> {
    Some(RedisSettings {
        host: var("REDIS_HOST")?,
        port: var_parsed("REDIS_PORT")?,
        password: var("REDIS_PASSWORD")?,
    })
}

pub fn mongo_from_env() -> Option<MongoSettings> {
    Some(MongoSettings {
        uri: var("MONGO_URI")?,
    })
}

pub fn smtp_from_env() -> Option<SmtpSettings> {
    Some(SmtpSettings {
        host: var("SMTP_HOST")?,
        port: var_parsed("SMTP_PORT")?,
        user: var("SMTP_USER")?,
        pass: var("SMTP_PASS")?,
        secure: var_bool("SMTP_SECURE").unwrap_or(false),
        from: var("SMTP_FROM")?,
    })
}

pub fn tokens_from_env() -> Option<TokenSettings> {
    Some(TokenSettings {
        access_secret: var("ACCESS_TOKEN_SECRET")?,
        refresh_secret: var("REFRESH_TOKEN_SECRET")?,
        access_expires_in: var_parsed("ACCESS_TOKEN_EXPIRES_IN")?,
        refresh_expires_in: var_parsed("REFRESH_TOKEN_EXPIRES_IN")?,
    })
}
