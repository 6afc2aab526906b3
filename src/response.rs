//! Gemini responses.
//!
//! A response is a status code, a space, a meta string and CRLF, followed by
//! the body for successful responses only.

/// The subset of Gemini status codes this server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Redirect,
    TemporaryFailure,
    NotFound,
    ProxyRequestRefused,
    BadRequest,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 20,
            Status::Redirect => 31,
            Status::TemporaryFailure => 40,
            Status::NotFound => 51,
            Status::ProxyRequestRefused => 53,
            Status::BadRequest => 59,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    /// Mime type on success, target URL on redirect, a message otherwise
    pub meta: String,
    pub body: Vec<u8>,
}

impl Response {
    pub fn success(mime_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Status::Success,
            meta: mime_type.into(),
            body: body.into(),
        }
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Self::bare(Status::Redirect, target)
    }

    pub fn not_found() -> Self {
        Self::bare(Status::NotFound, "Not found")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::bare(Status::BadRequest, message)
    }

    pub fn proxy_refused() -> Self {
        Self::bare(Status::ProxyRequestRefused, "Only gemini:// URLs are supported")
    }

    pub fn temporary_failure() -> Self {
        Self::bare(Status::TemporaryFailure, "Temporary failure")
    }

    fn bare(status: Status, meta: impl Into<String>) -> Self {
        Self {
            status,
            meta: meta.into(),
            body: Vec::new(),
        }
    }

    /// Serialize header and body into wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("{} {}\r\n", self.status.code(), self.meta).into_bytes();
        if self.status == Status::Success {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let response = Response::success("text/gemini", "# Hello\nWorld").to_bytes();
        assert!(response.starts_with(b"20 text/gemini\r\n"));
        assert!(response.ends_with(b"# Hello\nWorld"));
    }

    #[test]
    fn test_not_found_response() {
        assert_eq!(Response::not_found().to_bytes(), b"51 Not found\r\n");
    }

    #[test]
    fn test_failure_never_carries_body() {
        let mut response = Response::temporary_failure();
        response.body = b"leaked".to_vec();
        assert_eq!(response.to_bytes(), b"40 Temporary failure\r\n");
    }

    #[test]
    fn test_redirect_meta_is_target() {
        let response = Response::redirect("/wiki/");
        assert_eq!(response.status.code(), 31);
        assert_eq!(response.to_bytes(), b"31 /wiki/\r\n");
    }
}
