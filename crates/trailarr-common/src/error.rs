//! Common error type for the storage layer.

/// Common error type for trailarr.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An internal error occurred, such as a blocking task that panicked.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::database("disk I/O error");
        assert_eq!(err.to_string(), "Database error: disk I/O error");

        let err = Error::internal("join error");
        assert_eq!(err.to_string(), "Internal error: join error");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::database("x"), Error::Database(_)));
        assert!(matches!(Error::internal("x"), Error::Internal(_)));
    }
}
