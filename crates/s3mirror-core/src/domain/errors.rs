//! Domain error types

use thiserror::Error;

/// Errors that can occur when validating domain entities
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The local root of a sync mapping must be an absolute path
    #[error("Sync root must be an absolute path: {0}")]
    RelativeRoot(String),

    /// The target bucket name is empty
    #[error("Bucket name must not be empty")]
    EmptyBucket,

    /// The credential profile name is empty
    #[error("Profile name must not be empty")]
    EmptyProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::RelativeRoot("data/docs".to_string());
        assert_eq!(err.to_string(), "Sync root must be an absolute path: data/docs");

        assert_eq!(DomainError::EmptyBucket.to_string(), "Bucket name must not be empty");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::EmptyProfile;
        let err2 = DomainError::EmptyProfile;
        assert_eq!(err1, err2);
        assert_ne!(err1, DomainError::EmptyBucket);
    }
}
