use thiserror::Error;

use crate::logging::LoggingError;
use crate::zone::Zone;

/// Unified result type for the zone bridge crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Lifecycle errors surfaced by the registry, bridges and shell.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("zone `{0}` is not one of top, center, bottom")]
    UnknownZone(String),
    #[error("bridge for zone `{0}` has not been initialized")]
    NotReady(Zone),
    #[error("zone registry is not active")]
    RegistryInactive,
    #[error("mount token for zone `{zone}` is stale (epoch {token_epoch}, current {current_epoch})")]
    StaleMount {
        zone: Zone,
        token_epoch: u64,
        current_epoch: u64,
    },
    #[error("shell is not mounted")]
    ShellNotMounted,
    #[error("invalid context: {0}")]
    InvalidContext(#[from] ContextError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Rejections raised while building a context variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("route name must not be empty")]
    EmptyRoute,
    #[error("theme {field} `{value}` is not a recognised colour")]
    InvalidColor { field: &'static str, value: String },
    #[error("user id must not be empty")]
    EmptyUserId,
}

/// Problems loading a `ShellConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },
}
