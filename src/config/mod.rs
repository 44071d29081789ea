use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;

use crate::services::events::Deadlines;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/contributions";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LIST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub deadlines: Deadlines,
    /// Header set by an authenticating gateway that carries the caller's user id.
    pub trusted_user_header: Option<HeaderName>,
    /// Comma-separated CORS allow-list.
    pub cors_allowed_origins: String,
    /// Production mode turns on HSTS.
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let trusted_user_header = env::var("TRUSTED_USER_HEADER")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .and_then(|name| match HeaderName::from_str(name.trim()) {
                Ok(header) => Some(header),
                Err(e) => {
                    tracing::warn!("Config: invalid TRUSTED_USER_HEADER '{}': {}", name, e);
                    None
                }
            });

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: parse_or("BIND_ADDR", default_bind_addr()),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            deadlines: Deadlines {
                write: Duration::from_millis(parse_or(
                    "STORE_WRITE_TIMEOUT_MS",
                    DEFAULT_WRITE_TIMEOUT_MS,
                )),
                list: Duration::from_millis(parse_or(
                    "STORE_LIST_TIMEOUT_MS",
                    DEFAULT_LIST_TIMEOUT_MS,
                )),
            },
            trusted_user_header,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            production: env::var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: default_bind_addr(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            deadlines: Deadlines::default(),
            trusted_user_header: None,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: invalid {} '{}': {}, using default", key, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}
