// Error types for the Tessera framework

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An error carrying an explicit HTTP status, raised by handlers
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    /// Response body encoding failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Status or headers were written after the response was committed
    #[error("Response already committed: {0}")]
    ResponseCommitted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::Http`] with the given status and message
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Http { status, .. } => *status,
            Error::BadGateway(_) => 502,

            // Default to 500 for unmapped errors
            _ => 500,
        }
    }

    /// The bare message rendered as the body of an error response.
    ///
    /// Unlike `Display`, this carries no variant prefix, so an
    /// `Error::http(500, "error")` renders as the literal body `error`.
    pub fn message(&self) -> String {
        match self {
            Error::Http { message, .. }
            | Error::Internal(message)
            | Error::BadGateway(message)
            | Error::Compression(message)
            | Error::ResponseCommitted(message) => message.clone(),
            Error::Io(err) => err.to_string(),
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_status_and_message() {
        let err = Error::http(500, "error");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "error");
        assert_eq!(err.to_string(), "HTTP error 500: error");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::http(404, "missing").status_code(), 404);
        assert!(Error::http(404, "missing").is_client_error());
        assert_eq!(Error::BadGateway("x".into()).status_code(), 502);
        assert_eq!(Error::Internal("x".into()).status_code(), 500);
        assert_eq!(Error::Compression("x".into()).status_code(), 500);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client went away");
        let err: Error = io.into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "client went away");
    }
}
