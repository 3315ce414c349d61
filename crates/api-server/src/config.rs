//! Server configuration read from the environment

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-jwt-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Page that renders shared boards; share links append `pm_share=<token>`
    pub public_base_url: String,
    pub allow_registration: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".pm-data"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            public_base_url: "http://localhost:8081/".to_string(),
            allow_registration: true,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(name: &str, default: bool) -> bool {
    match env_value(name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

fn env_parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env_value(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Read `PM_*` variables, falling back to defaults for unset ones
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = env_value("PM_JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("PM_JWT_SECRET is not set, using the development secret");
            defaults.jwt_secret.clone()
        });
        let token_ttl_hours: i64 = env_parsed("PM_TOKEN_TTL_HOURS", defaults.token_ttl_hours)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "PM_TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        Ok(Self {
            data_dir: env_value("PM_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            bind_addr: env_parsed("PM_BIND_ADDR", defaults.bind_addr)?,
            jwt_secret,
            token_ttl_hours,
            public_base_url: env_value("PM_PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            allow_registration: env_flag("PM_ALLOW_REGISTRATION", defaults.allow_registration),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("board.sqlite3")
    }
}
