use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::identity::ServiceCredential;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub store_timeout: Duration,
    pub service_role_key: Option<ServiceCredential>,
    pub seed_demo_accounts: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            store_timeout: Duration::from_millis(parse_or_default("STORE_TIMEOUT_MS", 2000)?),
            service_role_key: env::var("SERVICE_ROLE_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(ServiceCredential::new),
            seed_demo_accounts: parse_or_default("SEED_DEMO_ACCOUNTS", false)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            store_timeout: Duration::from_millis(2000),
            service_role_key: None,
            seed_demo_accounts: false,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
