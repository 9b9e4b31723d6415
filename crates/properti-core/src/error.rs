//! Error types for properti-search.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using properti-search's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for properti-search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Datastore could not be reached (connection refused, pool exhausted, ...)
    #[error("Datastore unavailable: {0}")]
    DatastoreUnavailable(String),

    /// A datastore call exceeded its time budget
    #[error("Datastore call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Every strategy failed, including the last-resort fallback
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// The invoking context cancelled the search
    #[error("Search cancelled")]
    Cancelled,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error originated from the datastore side of a strategy
    /// call (and is therefore eligible for fallthrough to a weaker strategy).
    pub fn is_strategy_error(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::DatastoreUnavailable(_) | Error::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("Search term is empty or invalid".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid input: Search term is empty or invalid"
        );
    }

    #[test]
    fn test_error_display_datastore_unavailable() {
        let err = Error::DatastoreUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Datastore unavailable: connection refused");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Datastore call timed out after 1500ms");
    }

    #[test]
    fn test_error_display_search_unavailable() {
        let err = Error::SearchUnavailable("fallback strategy failed".to_string());
        assert_eq!(err.to_string(), "Search unavailable: fallback strategy failed");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Search cancelled");
    }

    #[test]
    fn test_strategy_error_classification() {
        assert!(Error::DatastoreUnavailable("x".into()).is_strategy_error());
        assert!(Error::Timeout(Duration::from_secs(1)).is_strategy_error());
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_strategy_error());

        assert!(!Error::InvalidInput("x".into()).is_strategy_error());
        assert!(!Error::Cancelled.is_strategy_error());
        assert!(!Error::SearchUnavailable("x".into()).is_strategy_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
