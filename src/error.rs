use thiserror::Error;

#[derive(Error, Debug)]
pub enum DvDebugError {
    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    #[error("No active tab found. Is the browser running with --remote-debugging-port?")]
    NoActiveTab,

    #[error("Please navigate to dragvertising.com or localhost:8080 ({0})")]
    UrlNotAllowed(String),

    #[error("Debug API not found. Make sure you are logged in as superadmin.")]
    ApiUnavailable,

    #[error("Unable to read debug state")]
    StateUnreadable,

    #[error("Failed to execute in page: {0}")]
    ExecutionFailed(String),

    #[error("Timed out waiting for {0}")]
    DependencyTimeout(String),

    #[error("Page storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Control channel error: {0}")]
    ControlChannel(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DvDebugError>;
