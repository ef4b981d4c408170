pub mod error;
pub mod scheduling_api;

pub use error::SchedulingApiError;
pub use scheduling_api::SchedulingApiClient;
