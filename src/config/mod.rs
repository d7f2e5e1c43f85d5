use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "memory" | "inmemory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(anyhow!("unknown STORAGE_BACKEND: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub storage_backend: StorageBackend,
    /// Only present when the Postgres backend is selected.
    pub db: Option<DbConfig>,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        let storage_backend: StorageBackend = env_or("STORAGE_BACKEND", "memory").parse()?;
        let db = match storage_backend {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(DbConfig {
                database_url: env_or_err("DATABASE_URL")?,
                max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
                connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
                idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
                max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            }),
        };

        let default_page_size = env_or_parse("DEFAULT_PAGE_SIZE", "20")?;
        let max_page_size = env_or_parse("MAX_PAGE_SIZE", "100")?;
        if default_page_size > max_page_size {
            return Err(anyhow!("DEFAULT_PAGE_SIZE must not exceed MAX_PAGE_SIZE"));
        }

        Ok(Self {
            http_addr,
            storage_backend,
            db,
            default_page_size,
            max_page_size,
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
