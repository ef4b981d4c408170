pub mod availability;
pub mod repository;
pub mod slot;

pub use availability::{compute_weekly_availability, week_start_for};
pub use repository::{HttpSlotRepository, SlotRepository};
pub use slot::SlotService;
