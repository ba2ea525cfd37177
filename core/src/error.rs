use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response.
/// Every error carries a machine code plus enough context for the calling
/// chat backend to decide whether to retry, fall back to text, or give up.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "unknown_function")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNKNOWN_FUNCTION: &str = "unknown_function";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Failures while turning a payload into a widget.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("invalid input for '{function}': {reason}")]
    InvalidInput { function: String, reason: String },
    #[error("function '{0}' is already registered")]
    DuplicateFunction(String),
}

/// Failures inside a single format adapter. Never fatal for the registry.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("adapter '{adapter}' rejected payload: {reason}")]
    Rejected {
        adapter: &'static str,
        reason: String,
    },
}

/// Failures of the on-disk config registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("config {id} not found for user '{user_id}'")]
    NotFound { user_id: String, id: u64 },
    #[error("unsafe path: {0}")]
    UnsafePath(String),
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("config storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
