/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no active run: {0}")]
    RunNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("artifact serialization: {0}")]
    Serde(#[from] serde_json::Error),
}
