//! Error types for content fetching, normalization and pagination

use thiserror::Error;

/// Errors raised while talking to the content API or shaping its records
#[derive(Debug, Error)]
pub enum Error {
    /// A record is missing a field the local model requires
    #[error("record {uid}: missing or invalid field `{field}`")]
    Validation { uid: String, field: &'static str },

    /// No document exists for the requested slug
    #[error("no post found for slug `{0}`")]
    NotFound(String),

    /// The request never produced a response
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status
    #[error("request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body was not the expected JSON shape
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A pagination URL outside the configured API origin
    #[error("refusing to fetch {0}: not on the configured API origin")]
    RejectedUrl(String),

    /// A page request was started while another one is still pending
    #[error("a page request is already in flight")]
    InFlight,

    /// The content source is misconfigured
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a validation failure
    pub fn missing(uid: &str, field: &'static str) -> Self {
        Error::Validation {
            uid: if uid.is_empty() {
                "<unknown>".to_string()
            } else {
                uid.to_string()
            },
            field,
        }
    }

    /// Whether this error means the document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_uses_placeholder_for_empty_uid() {
        let err = Error::missing("", "uid");
        assert_eq!(
            err.to_string(),
            "record <unknown>: missing or invalid field `uid`"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::missing("a", "title").is_not_found());
    }
}
