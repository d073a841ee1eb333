//! Error taxonomy shared by the store, editing service and resolver.

/// Failures surfaced by context operations.
///
/// Nothing in this crate retries on `StoreUnavailable`; callers own backoff.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Empty required field, invalid scope or invalid priority.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown id on update, delete or toggle.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying storage could not serve the request.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ContextError {
    /// Stable code used in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<rusqlite::Error> for ContextError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ContextError::Validation(e.to_string())
            }
            _ => ContextError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(e: serde_json::Error) -> Self {
        ContextError::StoreUnavailable(format!("stored value is not valid JSON: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
