/// Result type alias for scrape operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid brand URL: {0}")]
    Validation(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
