pub mod proxy;

/// How a failed fetch should be treated by its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network trouble or a 5xx; the next poll or interaction retries it
    Transient,
    /// The service does not know the requested symbol; shown as "no data"
    NotFound,
    /// The request cannot succeed until the user changes something
    Rejected,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Fetch error: {0}")]
    FetchError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Parsing error: {0}")]
    ParseError(String),
    #[error("Missing credentials.")]
    MissingCredential,
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::FetchError(_)
            | AdapterError::Timeout
            | AdapterError::ServerError { .. }
            | AdapterError::ParseError(_) => ErrorKind::Transient,
            AdapterError::NotFound(_) => ErrorKind::NotFound,
            AdapterError::MissingCredential => ErrorKind::Rejected,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else {
            // strip the url, it may carry credential query params
            AdapterError::FetchError(err.without_url().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert_eq!(
            AdapterError::ServerError {
                status: 503,
                body: String::new()
            }
            .kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            AdapterError::NotFound("ZZZZ".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(AdapterError::MissingCredential.kind(), ErrorKind::Rejected);
    }
}
