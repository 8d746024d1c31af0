use std::env;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::error::ConfigError;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "cloudbs.dev";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origin: HeaderValue,
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
    pub cache_max_entries: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGIN.to_string());
        let allowed_origin =
            HeaderValue::from_str(&origin).map_err(|_| ConfigError::InvalidOrigin(origin))?;

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or("SERVER_PORT", 8080),
            allowed_origin,
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", 10)),
            store_timeout: Duration::from_millis(parse_or("STORE_TIMEOUT_MS", 2000)),
            cache_max_entries: parse_or("CACHE_MAX_ENTRIES", 10_000),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
