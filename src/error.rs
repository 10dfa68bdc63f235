use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Requested duration {0}s is outside provider bounds (900-43200s)")]
    InvalidDuration(i32),

    #[error("No usable base credentials: {0}")]
    NoCredentials(String),

    #[error("Trust exchange denied: {0}")]
    Denied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient transport failure: {0}")]
    Transient(String),

    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("Environment '{0}' not found")]
    EnvironmentNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RoleError>;
