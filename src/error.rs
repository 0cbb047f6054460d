//! Error types for inbox-digest.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mail transport errors. Any one of these aborts the whole fetch —
/// the fetcher never returns partial results.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Missing or invalid credentials: {0}")]
    Auth(String),

    #[error("Authentication failed - token may be expired")]
    Unauthorized,

    #[error("Insufficient permissions or quota exceeded")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Mail API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Generation transport errors. The correlator converts every one of
/// these into per-message degradation values, so they never cross the
/// `enrich` boundary as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Missing or invalid credentials: {0}")]
    Auth(String),

    #[error("Authentication failed for generation provider")]
    Unauthorized,

    #[error("Insufficient permissions or quota exceeded")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Generation API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Generation run failed: {0}")]
    RunFailed(String),

    #[error("Generation run timed out")]
    Timeout,

    #[error("Invalid response from generation provider: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
