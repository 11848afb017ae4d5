use thiserror::Error;

/// Rejected before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter at least {min} characters")]
    QueryTooShort { min: usize },
}

/// Weather provider failures. All of them put the session into its error phase.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach weather provider: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather provider request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed weather provider response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Location lookup failures. Logged, never shown to the user.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}
