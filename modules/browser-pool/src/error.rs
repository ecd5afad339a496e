/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("browser pool init failed: {0}")]
    Init(String),

    #[error("timed out waiting for a free browser worker")]
    AcquireTimeout,

    #[error("browser pool is closed")]
    Closed,

    #[error("page load timed out after {0:?}")]
    NavigationTimeout(std::time::Duration),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
