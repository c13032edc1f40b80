//! Runtime configuration read from the environment.
//!
//!   DATABASE_URL        Postgres connection string; contacts are kept in
//!                       memory when unset
//!   BIND_ADDR           listen address (default: 0.0.0.0:8080)
//!   DB_MAX_CONNECTIONS  pool size (default: 2 per CPU)
//!   COUNTRY_CODE        prefixed to phones in links (default: 55)
//!   PLACEHOLDER_TOKEN   name placeholder in templates (default: {NOME})
//!   PREVIEW_NAME        name used by template previews (default: João Silva)

use std::net::SocketAddr;

use thiserror::Error;

use crate::template::{DEFAULT_PREVIEW_NAME, DEFAULT_TOKEN};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub country_code: String,
    pub placeholder_token: String,
    pub preview_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(addr) => addr.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: format!("{e}"),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(n) => match n.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got '{n}'"),
                    })
                }
            },
            None => (num_cpus::get() * 2) as u32,
        };

        let country_code = var("COUNTRY_CODE")
            .map(|c| c.trim().trim_start_matches('+').to_string())
            .unwrap_or_else(|| "55".to_string());
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                key: "COUNTRY_CODE",
                reason: format!("expected digits, got '{country_code}'"),
            });
        }

        Ok(Self {
            database_url: var("DATABASE_URL"),
            bind_addr,
            max_connections,
            country_code,
            placeholder_token: var("PLACEHOLDER_TOKEN").unwrap_or_else(|| DEFAULT_TOKEN.into()),
            preview_name: var("PREVIEW_NAME").unwrap_or_else(|| DEFAULT_PREVIEW_NAME.into()),
        })
    }
}
