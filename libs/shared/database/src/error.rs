use thiserror::Error;

/// Transport-level failures talking to the remote scheduling service.
#[derive(Error, Debug)]
pub enum SchedulingApiError {
    #[error("Scheduling service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scheduling service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid scheduling service payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid scheduling service configuration: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for SchedulingApiError {
    fn from(err: serde_json::Error) -> Self {
        SchedulingApiError::InvalidPayload(err.to_string())
    }
}

impl SchedulingApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SchedulingApiError::Status { status, .. } => Some(*status),
            SchedulingApiError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
