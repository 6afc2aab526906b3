use std::io;

use crate::response::{Response, Status};

/// Custom error types for the wiki application
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found")]
    NotFound,
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Route error: {0}")]
    Route(#[from] regex::Error),
}

impl WikiError {
    /// Gemini status this error is reported as
    pub fn status(&self) -> Status {
        match self {
            WikiError::NotFound => Status::NotFound,
            WikiError::InvalidPath(_) | WikiError::BadRequest(_) => Status::BadRequest,
            WikiError::Io(_) | WikiError::Config(_) | WikiError::Render(_) | WikiError::Route(_) => {
                Status::TemporaryFailure
            }
        }
    }

    /// Convert into the response sent to the client.
    ///
    /// Internal failures never leak their message to the client.
    pub fn into_response(self) -> Response {
        match self.status() {
            Status::NotFound => Response::not_found(),
            Status::BadRequest => Response::bad_request(self.to_string()),
            _ => Response::temporary_failure(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(WikiError::NotFound.status().code(), 51);
        assert_eq!(WikiError::InvalidPath("..".into()).status().code(), 59);
        assert_eq!(WikiError::Render("boom".into()).status().code(), 40);
    }

    #[test]
    fn test_internal_error_hides_message() {
        let err = WikiError::Io(io::Error::other("disk on fire"));
        let response = err.into_response();
        assert_eq!(response.meta, "Temporary failure");
        assert!(response.body.is_empty());
    }
}
