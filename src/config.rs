// src/config.rs
use log::{info, warn};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Production endpoint; the CNPJ and both dates are appended as path segments.
pub const DEFAULT_BASE_URL: &str = "https://www.okanebox.com.br/api/fundoinvestimento/hist";

pub const DEFAULT_PORT: u16 = 3030;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OKANEBOX_TOKEN is not set")]
    MissingToken,

    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct OkaneboxConfig {
    pub base_url: String,
    pub token: String,
    /// `None` keeps the request unbounded.
    pub timeout: Option<Duration>,
}

impl OkaneboxConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        OkaneboxConfig {
            base_url: base_url.into(),
            token: token.into(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub okanebox: OkaneboxConfig,
    pub port: u16,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv().ok()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `lookup` returns `None` for unset names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("OKANEBOX_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let base_url = lookup("OKANEBOX_BASE_URL").unwrap_or_else(|| {
            info!("OKANEBOX_BASE_URL not set, using {}", DEFAULT_BASE_URL);
            DEFAULT_BASE_URL.to_string()
        });

        let timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                    name: "FETCH_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT",
                value: value.clone(),
            })?,
            None => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        Ok(AppConfig {
            okanebox: OkaneboxConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
                timeout,
            },
            port,
        })
    }
}
