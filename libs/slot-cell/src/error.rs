use chrono::Weekday;
use thiserror::Error;

use shared_database::SchedulingApiError;
use shared_models::error::AppError;

use crate::models::weekday_name;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("The scheduling service returned no schedule")]
    MissingSchedule,

    #[error("The weekly schedule has no facility")]
    MissingFacility,

    #[error("No work period reported for {}", weekday_name(.0))]
    MissingWorkPeriod(Weekday),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("The slot is not available.")]
    SlotNotAvailable,

    #[error("Failed to book a slot. {0}")]
    BookingFailed(#[source] SchedulingApiError),

    #[error("Failed to load the weekly schedule. {0}")]
    Upstream(#[from] SchedulingApiError),

    #[error("{0}")]
    Validation(String),

    #[error("Scheduling client is misconfigured. {0}")]
    Configuration(#[source] SchedulingApiError),
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        let message = err.to_string();

        match err {
            SlotError::Validation(_) => AppError::ValidationError(message),
            SlotError::MissingSchedule
            | SlotError::MissingFacility
            | SlotError::MissingWorkPeriod(_)
            | SlotError::InvalidSchedule(_)
            | SlotError::Upstream(_) => AppError::BadRequest(message),
            SlotError::SlotNotAvailable => AppError::Conflict(message),
            SlotError::BookingFailed(_) => AppError::ExternalService(message),
            SlotError::Configuration(_) => AppError::Internal(message),
        }
    }
}
