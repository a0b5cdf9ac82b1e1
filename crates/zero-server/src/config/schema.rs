use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use zero_core::error::{Result, ZeroError};
use zero_core::NewUser;

use crate::ops::shutdown::DrainPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub store: StoreSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ZeroError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.store.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Reported in health responses; resolved from the OS when absent.
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            hostname: None,
            health_path: default_health_path(),
            grace_period_ms: default_grace_period_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if !self.health_path.starts_with('/') {
            return Err(ZeroError::Config(
                "server.health_path must start with '/'".into(),
            ));
        }
        if !self.health_path.chars().all(is_route_char) {
            return Err(ZeroError::Config(format!(
                "server.health_path may only contain letters, digits and '/-_.~': {}",
                self.health_path
            )));
        }
        if RESERVED_PATHS.contains(&self.health_path.as_str())
            || self.health_path.starts_with("/api/users/")
        {
            return Err(ZeroError::Config(format!(
                "server.health_path must not shadow {}",
                self.health_path
            )));
        }
        if self.grace_period_ms > 120_000 {
            return Err(ZeroError::Config(
                "server.grace_period_ms must be at most 120000".into(),
            ));
        }
        if !(100..=600_000).contains(&self.shutdown_timeout_ms) {
            return Err(ZeroError::Config(
                "server.shutdown_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if let Some(h) = &self.hostname {
            if h.trim().is_empty() {
                return Err(ZeroError::Config("server.hostname must not be blank".into()));
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ZeroError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }

    pub fn drain_policy(&self) -> DrainPolicy {
        DrainPolicy {
            grace_period: Duration::from_millis(self.grace_period_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }
}

// Anything else may be taken by the router as a capture or wildcard.
fn is_route_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '~')
}

// Routes the service mounts itself.
const RESERVED_PATHS: &[&str] = &["/metrics", "/api/users", "/api/error"];

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_health_path() -> String {
    "/health".into()
}
fn default_grace_period_ms() -> u64 {
    5000
}
fn default_shutdown_timeout_ms() -> u64 {
    20000
}

/// Data-access connection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default = "default_store_host")]
    pub host: String,

    #[serde(default = "default_store_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    pub name: String,

    /// Records inserted when the store is opened.
    #[serde(default)]
    pub seed: Vec<NewUser>,
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ZeroError::Config("store.name must not be empty".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ZeroError::Config("store.host must not be empty".into()));
        }
        Ok(())
    }

    /// Connection string with the password masked, safe for logs.
    pub fn redacted_dsn(&self) -> String {
        let pass = if self.password.is_empty() { "" } else { "***" };
        format!("{}:{}@tcp({})/{}", self.user, pass, self.host, self.name)
    }
}

fn default_store_host() -> String {
    "mysql-mysql:3306".into()
}
fn default_store_user() -> String {
    "root".into()
}
