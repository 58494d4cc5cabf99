//! Configuration module
//!
//! Configuration is loaded from the environment (with `.env` support) and
//! validated fail-fast at startup.

use std::env;

// Common defaults
const DEFAULT_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const ACCESS_EXPIRATION_MINUTES: i64 = 30;
const REFRESH_EXPIRATION_DAYS: i64 = 30;
const RESET_PASSWORD_EXPIRATION_MINUTES: i64 = 10;
const VERIFY_EMAIL_EXPIRATION_MINUTES: i64 = 10;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Registered domain the service is reachable under; the left-most label
    /// in front of it is the tenant slug (e.g. `acme.example.com`).
    pub base_domain: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_access_expiration_minutes: i64,
    pub jwt_refresh_expiration_days: i64,
    pub jwt_reset_password_expiration_minutes: i64,
    pub jwt_verify_email_expiration_minutes: i64,
    // Email (optional; auth email flows degrade to log-only without SMTP)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub frontend_url: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment, reading `.env` when present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;
        if jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        let cors_origins = env_opt("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server_port: env_parse("PORT", DEFAULT_PORT),
            environment: env_opt("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            base_domain: env_opt("BASE_DOMAIN").unwrap_or_else(|| "localhost".to_string()),
            cors_origins,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            jwt_access_expiration_minutes: env_parse(
                "JWT_ACCESS_EXPIRATION_MINUTES",
                ACCESS_EXPIRATION_MINUTES,
            ),
            jwt_refresh_expiration_days: env_parse(
                "JWT_REFRESH_EXPIRATION_DAYS",
                REFRESH_EXPIRATION_DAYS,
            ),
            jwt_reset_password_expiration_minutes: env_parse(
                "JWT_RESET_PASSWORD_EXPIRATION_MINUTES",
                RESET_PASSWORD_EXPIRATION_MINUTES,
            ),
            jwt_verify_email_expiration_minutes: env_parse(
                "JWT_VERIFY_EMAIL_EXPIRATION_MINUTES",
                VERIFY_EMAIL_EXPIRATION_MINUTES,
            ),
            smtp_host: env_opt("SMTP_HOST"),
            smtp_port: env_opt("SMTP_PORT").and_then(|v| v.parse().ok()),
            smtp_user: env_opt("SMTP_USER"),
            smtp_password: env_opt("SMTP_PASSWORD"),
            smtp_from: env_opt("SMTP_FROM"),
            smtp_tls: env_parse("SMTP_TLS", true),
            frontend_url: env_opt("FRONTEND_URL"),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
