/**
 * Server Configuration
 *
 * Configuration is read from environment variables (after `.env` has been
 * loaded by the binary). Only `JWT_SECRET` is required; everything else has
 * a development default or is optional.
 *
 * | Variable                   | Default | Meaning                                   |
 * |----------------------------|---------|-------------------------------------------|
 * | `SERVER_PORT`              | 3000    | HTTP listen port                          |
 * | `JWT_SECRET`               | -       | HS256 secret for token verification       |
 * | `DATABASE_URL`             | unset   | PostgreSQL; unset means in-memory stores  |
 * | `WEBHOOK_TIMEOUT_SECS`     | 10      | Per-call webhook timeout                  |
 * | `EMAIL_QUEUE_CAPACITY`     | 256     | Pending email jobs before rejecting       |
 * | `OUTBOUND_QUEUE_CAPACITY`  | 256     | Pending frames per socket before dropping |
 * | `CLEANUP_INTERVAL_SECS`    | 300     | Idle timer-lock pruning period            |
 * | `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `SMTP_FROM` | unset | SMTP relay; all four enable email |
 *
 * # Error Handling
 *
 * A missing or malformed variable is a `ConfigError`. Database problems are
 * not: `load_database` logs them and the server continues without the
 * database.
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("Invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}

/// SMTP relay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub webhook_timeout: Duration,
    pub email_queue_capacity: usize,
    pub outbound_queue_capacity: usize,
    pub cleanup_interval: Duration,
    pub smtp: Option<SmtpSettings>,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing { name: "JWT_SECRET" })?;

        let smtp = match (
            var("SMTP_HOST"),
            var("SMTP_USERNAME"),
            var("SMTP_PASSWORD"),
            var("SMTP_FROM"),
        ) {
            (Some(host), Some(username), Some(password), Some(from)) => Some(SmtpSettings {
                host,
                username,
                password,
                from,
            }),
            _ => None,
        };

        Ok(Self {
            port: parse_or(&var, "SERVER_PORT", 3000)?,
            jwt_secret,
            database_url: var("DATABASE_URL"),
            webhook_timeout: Duration::from_secs(parse_or(&var, "WEBHOOK_TIMEOUT_SECS", 10)?),
            email_queue_capacity: parse_nonzero(&var, "EMAIL_QUEUE_CAPACITY", 256)?,
            outbound_queue_capacity: parse_nonzero(&var, "OUTBOUND_QUEUE_CAPACITY", 256)?,
            cleanup_interval: Duration::from_secs(parse_nonzero(&var, "CLEANUP_INTERVAL_SECS", 300)?),
            smtp,
        })
    }

    pub fn builder(jwt_secret: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self {
                port: 3000,
                jwt_secret: jwt_secret.into(),
                database_url: None,
                webhook_timeout: Duration::from_secs(10),
                email_queue_capacity: 256,
                outbound_queue_capacity: 256,
                cleanup_interval: Duration::from_secs(300),
                smtp: None,
            },
        }
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Like `parse_or`, but zero is rejected as `Invalid`
fn parse_nonzero<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(var, name, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: var(name).unwrap_or_default(),
        });
    }
    Ok(value)
}

/// Builder used by tests and embedders
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn webhook_timeout(mut self, timeout: Duration) -> Self {
        self.config.webhook_timeout = timeout;
        self
    }

    pub fn outbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_queue_capacity = capacity.max(1);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn smtp(mut self, smtp: SmtpSettings) -> Self {
        self.config.smtp = Some(smtp);
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

/// Connect to PostgreSQL and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if no URL is configured or the connection fails
///
/// Migration failures are logged and the pool is still returned; the schema
/// may already be current.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Using in-memory stores.");
        return None;
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to in-memory stores.");
            return None;
        }
    };
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
