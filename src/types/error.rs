//! Error types for Archway

use hyper::StatusCode;

/// Main error type for Archway operations
#[derive(Debug, thiserror::Error)]
pub enum ArchwayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Actor lacks privilege for a mutation. Never downgraded to a no-op.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Target record absent. For deletes the end state matches intent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient backend failure. Retryable; distinct from Unauthorized.
    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Blob removed but the database row survives. Operators must clean up
    /// the dangling row reference manually.
    #[error("Partial delete: {0}")]
    PartialDelete(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArchwayError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RegistryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PartialDelete(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RegistryUnavailable(_) => "REGISTRY_UNAVAILABLE",
            Self::PartialDelete(_) => "PARTIAL_DELETE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DB_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for ArchwayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ArchwayError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ArchwayError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ArchwayError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for ArchwayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for Archway operations
pub type Result<T> = std::result::Result<T, ArchwayError>;
