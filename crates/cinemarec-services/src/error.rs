use thiserror::Error;

/// Failure talking to one of the backend services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP 401, or a call that needs a session made without one
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Failed to {action}: {status} - {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response while trying to {action}: {message}")]
    Decode { action: String, message: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Config(String),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Unauthorized(_) => Some(401),
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn decode(action: &str, err: impl std::fmt::Display) -> Self {
        ServiceError::Decode {
            action: action.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let missing = ServiceError::Status {
            action: "fetch preferences".to_string(),
            status: 404,
            body: String::new(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_unauthorized());
        assert_eq!(missing.to_string(), "Failed to fetch preferences: 404 - ");

        let denied = ServiceError::Unauthorized("token expired".to_string());
        assert!(denied.is_unauthorized());
        assert_eq!(denied.status(), Some(401));
    }
}
