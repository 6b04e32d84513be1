//! Shared error type across gqlgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API, sent as `extensions.code`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Operation document could not be parsed.
    ParseFailed,
    /// Operation document parsed but does not fit the schema.
    ValidationFailed,
    /// Hash-only persisted query request missed the cache.
    PersistedQueryNotFound,
    /// Persisted query hash does not match the supplied query text.
    PersistedQueryHashMismatch,
    /// Persisted query protocol version not supported.
    PersistedQueryNotSupported,
    /// Operation kind not supported on this transport.
    OperationNotSupported,
    /// Rejected by origin policy.
    OriginNotAllowed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::ParseFailed => "GRAPHQL_PARSE_FAILED",
            ClientCode::ValidationFailed => "GRAPHQL_VALIDATION_FAILED",
            ClientCode::PersistedQueryNotFound => "PERSISTED_QUERY_NOT_FOUND",
            ClientCode::PersistedQueryHashMismatch => "PERSISTED_QUERY_HASH_MISMATCH",
            ClientCode::PersistedQueryNotSupported => "PERSISTED_QUERY_NOT_SUPPORTED",
            ClientCode::OperationNotSupported => "OPERATION_NOT_SUPPORTED",
            ClientCode::OriginNotAllowed => "ORIGIN_NOT_ALLOWED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GqlGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GqlGateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    ParseFailed { message: String, line: usize, column: usize },
    #[error("{0}")]
    ValidationFailed(String),
    /// Message text is part of the APQ wire protocol; clients match on it.
    #[error("PersistedQueryNotFound")]
    PersistedQueryNotFound,
    #[error("provided APQ hash does not match query")]
    PersistedQueryHashMismatch,
    #[error("unsupported persisted query version: {0}")]
    PersistedQueryNotSupported(u32),
    #[error("operation not supported: {0}")]
    OperationNotSupported(String),
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GqlGateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GqlGateError::BadRequest(_) => ClientCode::BadRequest,
            GqlGateError::ParseFailed { .. } => ClientCode::ParseFailed,
            GqlGateError::ValidationFailed(_) => ClientCode::ValidationFailed,
            GqlGateError::PersistedQueryNotFound => ClientCode::PersistedQueryNotFound,
            GqlGateError::PersistedQueryHashMismatch => ClientCode::PersistedQueryHashMismatch,
            GqlGateError::PersistedQueryNotSupported(_) => ClientCode::PersistedQueryNotSupported,
            GqlGateError::OperationNotSupported(_) => ClientCode::OperationNotSupported,
            GqlGateError::OriginNotAllowed(_) => ClientCode::OriginNotAllowed,
            GqlGateError::Internal(_) => ClientCode::Internal,
        }
    }
}
