//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
///
/// `Unavailable` is the only retryable variant; everything else requires a
/// change on the caller's side or indicates a missing object.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or failed transiently. Retryable.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the write (permissions, quota, precondition).
    #[error("storage backend rejected the write: {0}")]
    WriteRejected(String),

    /// Object not found in storage.
    #[error("object not found: {key}")]
    ObjectNotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by the backend.
    #[error("presign operation not supported by storage backend")]
    PresignNotSupported,

    /// Storage backend configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create an object-not-found error.
    #[must_use]
    pub fn object_not_found(key: impl Into<String>) -> Self {
        Self::ObjectNotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether a caller may retry the failed operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::ObjectNotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            opendal::ErrorKind::PermissionDenied | opendal::ErrorKind::AlreadyExists => {
                Self::WriteRejected(err.to_string())
            }
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(StorageError::Unavailable("timeout".into()).is_retryable());
        assert!(!StorageError::WriteRejected("quota".into()).is_retryable());
        assert!(!StorageError::object_not_found("a/b").is_retryable());
        assert!(!StorageError::PresignNotSupported.is_retryable());
        assert!(!StorageError::configuration("bad endpoint").is_retryable());
    }
}
