//! Error types for the storage engine.

use thiserror::Error;

/// Error type for engine and persistence operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("value is not an integer")]
    NotInteger,

    #[error("increment or decrement would overflow")]
    Overflow,

    #[error("append-only log error: {0}")]
    Aof(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_integer_display() {
        assert_eq!(StoreError::NotInteger.to_string(), "value is not an integer");
    }

    #[test]
    fn test_overflow_display() {
        assert_eq!(
            StoreError::Overflow.to_string(),
            "increment or decrement would overflow"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(err.to_string().contains("denied"));
    }
}
