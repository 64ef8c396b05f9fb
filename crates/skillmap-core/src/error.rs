//! Error types for skillmap.

use thiserror::Error;

/// Result type alias using skillmap's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for skillmap operations.
///
/// Row-local business failures (missing master data, malformed fields) are
/// deliberately NOT variants here; they travel as [`crate::RowError`] data
/// attached to a row outcome and never abort an import sweep.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Skill not found
    #[error("Skill not found: {0}")]
    SkillNotFound(uuid::Uuid),

    /// Import job not found
    #[error("Import job not found: {0}")]
    JobNotFound(uuid::Uuid),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Import job lifecycle error
    #[error("Job error: {0}")]
    Job(String),

    /// Uniqueness conflict (e.g. alias text already claimed by another skill)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Source file could not be parsed at all
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("roster upload".to_string());
        assert_eq!(err.to_string(), "Not found: roster upload");
    }

    #[test]
    fn test_error_display_skill_not_found() {
        let id = Uuid::nil();
        let err = Error::SkillNotFound(id);
        assert_eq!(err.to_string(), format!("Skill not found: {}", id));
    }

    #[test]
    fn test_error_display_job_not_found() {
        let id = Uuid::new_v4();
        let err = Error::JobNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("backend timed out".to_string());
        assert_eq!(err.to_string(), "Embedding error: backend timed out");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("alias 'js' belongs to another skill".to_string());
        assert_eq!(
            err.to_string(),
            "Conflict: alias 'js' belongs to another skill"
        );
    }

    #[test]
    fn test_error_display_parse() {
        let err = Error::Parse("header row missing".to_string());
        assert_eq!(err.to_string(), "Parse error: header row missing");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("invalid threshold".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid threshold");
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
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
