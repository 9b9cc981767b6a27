use cinemarec_services::ServiceError;
use thiserror::Error;

/// Everything a view-model can report back to the screen
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewError {
    /// Missing, invalid or expired credential. The caller purges it and sends the user to login.
    #[error("Session expired or invalid: {0}")]
    Auth(String),

    /// Network or backend failure; local state was left unchanged
    #[error("{0}")]
    Service(String),

    /// Rejected by a client-side check before any request was made
    #[error("{0}")]
    Validation(String),
}

pub type ViewResult<T> = Result<T, ViewError>;

impl ViewError {
    pub fn validation(message: impl Into<String>) -> Self {
        ViewError::Validation(message.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ViewError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ViewError::Validation(_))
    }
}

impl From<ServiceError> for ViewError {
    fn from(err: ServiceError) -> Self {
        if err.is_unauthorized() {
            ViewError::Auth(err.to_string())
        } else {
            ViewError::Service(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ViewError {
    fn from(err: anyhow::Error) -> Self {
        ViewError::Service(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_auth() {
        let err: ViewError = ServiceError::Unauthorized("fetch reviews was rejected".to_string()).into();
        assert!(err.is_auth());

        let err: ViewError = ServiceError::Status {
            action: "fetch reviews".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(err, ViewError::Service("Failed to fetch reviews: 502 - bad gateway".to_string()));
    }
}
