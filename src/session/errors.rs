use thiserror::Error;

/// Errors surfaced by the auth backend client.
///
/// Only `login` lets these escape the session manager; verify, refresh and
/// logout fold them into state transitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl AppError {
    /// HTTP status of a backend rejection, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 style rejections of the supplied credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_includes_status_for_http_errors() {
        let err = AppError::Http {
            status: 423,
            message: "Account locked".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed (423): Account locked");
        assert_eq!(err.status(), Some(423));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_detection() {
        let err = AppError::Http {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(!AppError::Timeout("slow".to_string()).is_unauthorized());
    }
}
