//! Server configuration parsed from environment variables.
//!
//! Numeric settings fall back to their defaults when unset or unparseable.
//! Settings that select behaviour (storage backend, public base URL) are
//! validated and reported as [`ConfigError`].

use std::path::PathBuf;

use axum::http::StatusCode;

use crate::error::ErrorCode;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_STORAGE_DIR: &str = "./data/objects";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_UPLOAD_TICKET_TTL_SECS: u64 = 900;
pub const DEFAULT_UPLOAD_RATE_PER_CLIENT: usize = 30;
pub const DEFAULT_UPLOAD_RATE_GLOBAL: usize = 600;
pub const DEFAULT_UPLOAD_RATE_WINDOW_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown STORAGE_BACKEND: {0} (expected 'memory' or 'fs')")]
    UnknownBackend(String),
    #[error("PUBLIC_BASE_URL must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBackend(_) => "E_CONFIG_BACKEND",
            Self::InvalidBaseUrl(_) => "E_CONFIG_BASE_URL",
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Fs,
}

impl StorageBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Fs => "fs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub port: u16,
    pub bind_addr: String,
    /// Prefix for absolute upload URLs handed to clients. No trailing slash.
    pub public_base_url: String,
    pub storage_backend: StorageBackend,
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub upload_ticket_ttl_secs: u64,
    /// Upload-URL requests allowed per client IP in each window.
    pub upload_rate_per_client: usize,
    /// Upload-URL requests allowed across all clients in each window.
    pub upload_rate_global: usize,
    pub upload_rate_window_secs: u64,
}

impl StudioConfig {
    /// Build config from process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PUBLIC_BASE_URL`: default `http://127.0.0.1:{PORT}`
    /// - `STORAGE_BACKEND`: `memory` (default) or `fs`
    /// - `STORAGE_DIR`: default `./data/objects`
    /// - `MAX_UPLOAD_BYTES`: default 5 MiB
    /// - `UPLOAD_TICKET_TTL_SECS`: default 900
    /// - `UPLOAD_RATE_PER_CLIENT`: default 30
    /// - `UPLOAD_RATE_GLOBAL`: default 600
    /// - `UPLOAD_RATE_WINDOW_SECS`: default 60
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend or a malformed base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StudioConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"))
            .trim_end_matches('/')
            .to_string();
        if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(public_base_url));
        }

        let storage_backend = parse_backend(lookup("STORAGE_BACKEND").as_deref())?;
        let storage_dir = lookup("STORAGE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        Ok(Self {
            port,
            bind_addr,
            public_base_url,
            storage_backend,
            storage_dir,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            upload_ticket_ttl_secs: parse_or(&lookup, "UPLOAD_TICKET_TTL_SECS", DEFAULT_UPLOAD_TICKET_TTL_SECS),
            upload_rate_per_client: parse_or(&lookup, "UPLOAD_RATE_PER_CLIENT", DEFAULT_UPLOAD_RATE_PER_CLIENT),
            upload_rate_global: parse_or(&lookup, "UPLOAD_RATE_GLOBAL", DEFAULT_UPLOAD_RATE_GLOBAL),
            upload_rate_window_secs: parse_or(&lookup, "UPLOAD_RATE_WINDOW_SECS", DEFAULT_UPLOAD_RATE_WINDOW_SECS),
        })
    }

    /// In-memory defaults for tests and embedding.
    #[must_use]
    pub fn in_memory(public_base_url: &str) -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            storage_backend: StorageBackend::Memory,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_ticket_ttl_secs: DEFAULT_UPLOAD_TICKET_TTL_SECS,
            upload_rate_per_client: DEFAULT_UPLOAD_RATE_PER_CLIENT,
            upload_rate_global: DEFAULT_UPLOAD_RATE_GLOBAL,
            upload_rate_window_secs: DEFAULT_UPLOAD_RATE_WINDOW_SECS,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_backend(raw: Option<&str>) -> Result<StorageBackend, ConfigError> {
    match raw.unwrap_or("memory") {
        "memory" => Ok(StorageBackend::Memory),
        "fs" => Ok(StorageBackend::Fs),
        other => Err(ConfigError::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
