//! Typed settings for each optional service, filled from the environment.

/// PostgreSQL connection settings. Built from `DATABASE_URL` when present,
/// otherwise assembled from the `DB_*` variables.
#[derive(Clone, Debug)]
pub struct SqlSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    /// Full URL override; wins over the individual parts when set.
    pub url: Option<String>,
}

impl SqlSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl RedisSettings {
    pub fn connection_url(&self) -> String {
        format!("redis://:{}@{}:{}", self.password, self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct MongoSettings {
    pub uri: String,
}

#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// Implicit TLS when true, STARTTLS upgrade when false.
    pub secure: bool,
    pub from: String,
}

/// Secrets and lifetimes for access/refresh tokens. Lifetimes are seconds.
#[derive(Clone, Debug)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expires_in: i64,
    pub refresh_expires_in: i64,
}
