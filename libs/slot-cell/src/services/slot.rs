use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc, Weekday};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::error::SlotError;
use crate::models::{weekday_name, BookSlotRequest, SlotBooking, WeeklyAvailability};
use crate::services::availability::{compute_weekly_availability, start_of_day, week_start_for};
use crate::services::repository::{HttpSlotRepository, SlotRepository};

/// Computes free slots and books them against the remote scheduling service.
///
/// Work periods are read in the facility's UTC offset, whatever offset a caller
/// writes its timestamps in. Holds no state between calls. Two concurrent
/// bookings of the same slot can both pass validation; the scheduling service
/// has the final say.
pub struct SlotService {
    repository: Arc<dyn SlotRepository>,
    facility_offset: FixedOffset,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Result<Self, SlotError> {
        let repository = HttpSlotRepository::new(config).map_err(SlotError::Configuration)?;

        Ok(Self::with_repository(Arc::new(repository)).with_facility_offset(config.facility_offset()))
    }

    /// Uses UTC as the facility offset until [`SlotService::with_facility_offset`] says otherwise.
    pub fn with_repository(repository: Arc<dyn SlotRepository>) -> Self {
        Self {
            repository,
            facility_offset: Utc.fix(),
        }
    }

    pub fn with_facility_offset(mut self, facility_offset: FixedOffset) -> Self {
        self.facility_offset = facility_offset;
        self
    }

    /// Free slots for the week starting on `week_start`, which must fall on a
    /// Monday in the facility's offset.
    pub async fn get_available_slots(
        &self,
        week_start: DateTime<FixedOffset>,
    ) -> Result<WeeklyAvailability, SlotError> {
        let local = week_start.with_timezone(&self.facility_offset);
        if local.weekday() != Weekday::Mon {
            return Err(SlotError::Validation("The date should be a Monday.".to_string()));
        }

        let week_start = start_of_day(local.date_naive(), self.facility_offset)
            .ok_or_else(|| SlotError::Validation(format!("{} is out of range", week_start)))?;

        debug!("Calculating available slots for week of {}", week_start.date_naive());

        let schedule = self
            .repository
            .fetch_weekly_busy_schedule(week_start)
            .await?
            .ok_or(SlotError::MissingSchedule)?;

        compute_weekly_availability(&schedule, week_start)
    }

    /// Re-derives the week's availability and forwards the booking only when
    /// `[start, end)` is exactly one of the free slots.
    pub async fn book_slot(&self, request: BookSlotRequest) -> Result<(), SlotError> {
        self.ensure_slot_is_available(&request).await?;

        let booking = SlotBooking::from(request);

        self.repository.submit_booking(&booking).await.map_err(|e| {
            error!("Failed to book a slot (upstream status {:?}): {}", e.status(), e);
            SlotError::BookingFailed(e)
        })?;

        info!("Booked slot {} - {} at facility {}", booking.start, booking.end, booking.facility_id);
        Ok(())
    }

    async fn ensure_slot_is_available(&self, request: &BookSlotRequest) -> Result<(), SlotError> {
        let start = request.start.with_timezone(&self.facility_offset);
        let week_start = week_start_for(start)
            .ok_or_else(|| SlotError::Validation(format!("{} is out of range", request.start)))?;
        let availability = self.get_available_slots(week_start).await?;

        // Instants compare equal across offsets.
        let day = start.weekday();
        let is_available = availability.day(day).is_some_and(|day_schedule| {
            day_schedule
                .available_slots
                .iter()
                .any(|slot| slot.start == request.start && slot.end == request.end)
        });

        if !is_available {
            warn!(
                "Rejected booking {} - {}: not a free slot on {}",
                request.start,
                request.end,
                weekday_name(&day)
            );
            return Err(SlotError::SlotNotAvailable);
        }

        Ok(())
    }
}
