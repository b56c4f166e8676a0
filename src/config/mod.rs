use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;

/// Which components the process runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    /// HTTP server plus an in-process verification consumer.
    Api,
    /// Verification consumer only; needs neither Postgres, Redis nor S3.
    Worker,
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "api" => Ok(AppMode::Api),
            "worker" => Ok(AppMode::Worker),
            other => Err(format!("unknown mode {:?}, expected \"api\" or \"worker\"", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub app_mode: AppMode,
    pub app_base_url: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub redis_url: String,
    pub s3_endpoint: String,
    pub s3_public_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_upload_folder: String,
    pub queue_endpoint: String,
    pub queue_region: String,
    pub queue_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub email_sender_name: String,
    pub email_sender_address: String,
    pub email_sender_password: String,
    pub session_ttl_hours: u64,
    pub auth_token_ttl_hours: u64,
    pub upload_max_bytes: usize,
    pub shutdown_grace_seconds: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Reads configuration from the process environment. A `.env` file in the
    /// working directory, when present, is loaded first; variables already set
    /// in the environment take precedence over it.
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(anyhow!("invalid .env file: {}", err));
            }
        }

        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:5000");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;
        let app_mode: AppMode = env_or_parse("APP_MODE", "api")?;

        let app_base_url = env_or("APP_BASE_URL", "http://localhost:5000");
        url::Url::parse(&app_base_url).map_err(|err| anyhow!("invalid APP_BASE_URL: {}", err))?;

        let s3_region = env_or("S3_REGION", "fr-par");
        let queue_region = std::env::var("QUEUE_REGION").unwrap_or_else(|_| s3_region.clone());

        Ok(Self {
            http_addr,
            app_mode,
            app_base_url,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1/"),
            s3_endpoint: env_or_err("S3_ENDPOINT")?,
            s3_public_endpoint: std::env::var("S3_PUBLIC_ENDPOINT").ok(),
            s3_region,
            s3_bucket: env_or_err("S3_BUCKET")?,
            s3_upload_folder: env_or("S3_UPLOAD_FOLDER", "posts"),
            queue_endpoint: env_or_err("QUEUE_ENDPOINT")?,
            queue_region,
            queue_name: env_or("QUEUE_NAME", "verify_email"),
            smtp_host: env_or("SMTP_HOST", "sandbox.smtp.mailtrap.io"),
            smtp_port: env_or_parse("SMTP_PORT", "25")?,
            email_sender_name: env_or_err("EMAIL_SENDER_NAME")?,
            email_sender_address: env_or_err("EMAIL_SENDER_ADDRESS")?,
            email_sender_password: env_or_err("EMAIL_SENDER_PASSWORD")?,
            session_ttl_hours: env_or_parse("SESSION_TTL_HOURS", "24")?,
            auth_token_ttl_hours: env_or_parse("AUTH_TOKEN_TTL_HOURS", "168")?,
            upload_max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "10485760")?,
            shutdown_grace_seconds: env_or_parse("SHUTDOWN_GRACE_SECONDS", "20")?,
            cookie_secure: env_or_parse("COOKIE_SECURE", "false")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
