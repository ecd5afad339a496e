/// Result type alias for LLM calls.
pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("provider rejected credentials")]
    Auth,

    #[error("provider rate limit exhausted")]
    RateLimited,

    #[error("provider returned invalid JSON: {0}")]
    Protocol(String),

    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned no content")]
    Empty,
}
