// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values, and the [`Config`] loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the registry database | `./data` |
//! | `SERVER_ID` | Stable server identifier; seeds this application's id | Random id |
//! | `TRUSTED_APP_KEY_BITS` | RSA modulus size for generated key pairs | `2048` |
//! | `TRUSTED_APP_FETCH_TIMEOUT_SECS` | Timeout for register-by-URL requests | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the server identifier.
pub const SERVER_ID_ENV: &str = "SERVER_ID";

/// Environment variable name for the generated key size.
pub const KEY_BITS_ENV: &str = "TRUSTED_APP_KEY_BITS";

/// Environment variable name for the peer fetch timeout.
pub const FETCH_TIMEOUT_ENV: &str = "TRUSTED_APP_FETCH_TIMEOUT_SECS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the registry database inside the data directory.
pub const DATABASE_FILE: &str = "trusted-apps.redb";

pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest key size accepted from the environment.
pub const MIN_KEY_BITS: usize = 1024;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub server_id: Option<String>,
    pub key_bits: usize,
    pub fetch_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            server_id: None,
            key_bits: DEFAULT_KEY_BITS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Invalid values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let data_dir = present(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let key_bits = match present(KEY_BITS_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(bits) if bits >= MIN_KEY_BITS => bits,
                _ => {
                    tracing::warn!(
                        variable = KEY_BITS_ENV,
                        value = %raw,
                        default = DEFAULT_KEY_BITS,
                        "Invalid key size, using default"
                    );
                    DEFAULT_KEY_BITS
                }
            },
            None => DEFAULT_KEY_BITS,
        };

        let fetch_timeout = match present(FETCH_TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        variable = FETCH_TIMEOUT_ENV,
                        value = %raw,
                        default = DEFAULT_FETCH_TIMEOUT_SECS,
                        "Invalid timeout, using default"
                    );
                    defaults.fetch_timeout
                }
            },
            None => defaults.fetch_timeout,
        };

        let log_format = match present(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(variable = LOG_FORMAT_ENV, value = %raw, "Unknown log format, using pretty");
                LogFormat::Pretty
            }),
            None => LogFormat::default(),
        };

        Self {
            data_dir,
            server_id: present(SERVER_ID_ENV).map(|id| id.trim().to_string()),
            key_bits,
            fetch_timeout,
            log_format,
        }
    }

    /// Path of the registry database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
