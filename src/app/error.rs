use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum TributaryError {
    #[error("Invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse feed {url}: {message}")]
    FeedParse { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("Post {link} already exists for feed {feed_id}")]
    DuplicatePost { feed_id: i64, link: String },

    #[error("Database connection lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Feed already exists: {0}")]
    FeedExists(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Coarse classification used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Parse,
    Persistence,
    NotFound,
    Config,
    Internal,
}

impl TributaryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TributaryError::InvalidUrl { .. } | TributaryError::FeedExists(_) => {
                ErrorKind::Validation
            }
            TributaryError::Http(_) | TributaryError::Status { .. } => ErrorKind::Transport,
            TributaryError::FeedParse { .. } => ErrorKind::Parse,
            TributaryError::Database(_)
            | TributaryError::Migration(_)
            | TributaryError::DuplicatePost { .. }
            | TributaryError::LockPoisoned(_) => ErrorKind::Persistence,
            TributaryError::FeedNotFound(_) => ErrorKind::NotFound,
            TributaryError::Config(_) => ErrorKind::Config,
            TributaryError::Io(_) | TributaryError::Scheduler(_) => ErrorKind::Internal,
        }
    }

    /// Whether the next scheduled cycle can be expected to succeed where this one failed.
    ///
    /// Validation errors are local to the stored URL and never clear up on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Parse | ErrorKind::Persistence
        )
    }
}

pub type Result<T> = std::result::Result<T, TributaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_not_retryable() {
        let err = TributaryError::InvalidUrl {
            url: "ftp://example.com".into(),
            reason: "unsupported scheme".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_and_parse_are_retryable() {
        let status = TributaryError::Status {
            url: "https://example.com/feed.xml".into(),
            status: 503,
        };
        assert_eq!(status.kind(), ErrorKind::Transport);
        assert!(status.is_retryable());

        let parse = TributaryError::FeedParse {
            url: "https://example.com/feed.xml".into(),
            message: "unexpected end of input".into(),
        };
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert!(parse.is_retryable());
    }

    #[test]
    fn test_duplicate_post_is_distinguishable() {
        let err = TributaryError::DuplicatePost {
            feed_id: 7,
            link: "https://example.com/a".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(matches!(err, TributaryError::DuplicatePost { feed_id: 7, .. }));
    }

    #[test]
    fn test_error_messages_name_the_feed() {
        let err = TributaryError::Status {
            url: "https://example.com/feed.xml".into(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "Feed https://example.com/feed.xml returned status 404"
        );
    }
}
