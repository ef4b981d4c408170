use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Weekday};
use reqwest::Method;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{SchedulingApiClient, SchedulingApiError};

use crate::models::{
    weekday_from_name, BusySlot, DaySchedule, Facility, SlotBooking, WeeklyBusySchedule, WorkPeriod,
};
use crate::services::availability::with_offset;

/// Access to the remote scheduling service, the source of truth for busy slots and bookings.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// `Ok(None)` means the service answered without a schedule.
    async fn fetch_weekly_busy_schedule(
        &self,
        week_start: DateTime<FixedOffset>,
    ) -> Result<Option<WeeklyBusySchedule>, SchedulingApiError>;

    /// Single attempt, no retry.
    async fn submit_booking(&self, booking: &SlotBooking) -> Result<(), SchedulingApiError>;
}

pub struct HttpSlotRepository {
    client: SchedulingApiClient,
}

impl HttpSlotRepository {
    pub fn new(config: &AppConfig) -> Result<Self, SchedulingApiError> {
        Ok(Self {
            client: SchedulingApiClient::new(config)?,
        })
    }
}

#[async_trait]
impl SlotRepository for HttpSlotRepository {
    async fn fetch_weekly_busy_schedule(
        &self,
        week_start: DateTime<FixedOffset>,
    ) -> Result<Option<WeeklyBusySchedule>, SchedulingApiError> {
        let path = format!("/GetWeeklyAvailability/{}", week_start.format("%Y%m%d"));
        debug!("Fetching weekly availability for week of {}", week_start.date_naive());

        let upstream: Option<UpstreamWeeklySchedule> = self.client.request(
            Method::GET,
            &path,
            None,
        ).await?;

        upstream
            .map(|schedule| schedule.into_weekly_schedule(*week_start.offset()))
            .transpose()
    }

    async fn submit_booking(&self, booking: &SlotBooking) -> Result<(), SchedulingApiError> {
        info!(
            "Booking slot {} - {} at facility {}",
            booking.start, booking.end, booking.facility_id
        );

        let body = serde_json::to_value(booking)?;
        self.client.execute(Method::POST, "/TakeSlot", Some(body)).await
    }
}

// ==============================================================================
// WIRE FORMAT
// ==============================================================================

/// Weekly payload as sent by the scheduling service. Day schedules sit next to
/// `Facility` and `SlotDurationMinutes` under keys named after the weekday.
#[derive(Debug, Default)]
struct UpstreamWeeklySchedule {
    facility: Option<Facility>,
    slot_duration_minutes: i64,
    /// Document order; a repeated day overrides the earlier one when converted.
    days: Vec<(Weekday, UpstreamDaySchedule)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpstreamDaySchedule {
    #[serde(default)]
    work_period: Option<WorkPeriod>,
    #[serde(default)]
    busy_slots: Option<Vec<UpstreamBusySlot>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpstreamBusySlot {
    start: String,
    end: String,
}

impl<'de> Deserialize<'de> for UpstreamWeeklySchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(UpstreamWeeklyScheduleVisitor)
    }
}

struct UpstreamWeeklyScheduleVisitor;

impl<'de> Visitor<'de> for UpstreamWeeklyScheduleVisitor {
    type Value = UpstreamWeeklySchedule;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a weekly availability object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut schedule = UpstreamWeeklySchedule::default();

        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("Facility") {
                schedule.facility = map.next_value()?;
            } else if key.eq_ignore_ascii_case("SlotDurationMinutes") {
                schedule.slot_duration_minutes = map.next_value::<Option<i64>>()?.unwrap_or_default();
            } else if let Some(day) = weekday_from_name(&key) {
                match map.next_value::<Option<UpstreamDaySchedule>>()? {
                    Some(day_schedule) if day_schedule.work_period.is_some() => {
                        schedule.days.push((day, day_schedule));
                    }
                    _ => debug!("Ignoring {} without a work period", key),
                }
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }

        Ok(schedule)
    }
}

impl UpstreamWeeklySchedule {
    fn into_weekly_schedule(self, offset: FixedOffset) -> Result<WeeklyBusySchedule, SchedulingApiError> {
        let mut schedule = WeeklyBusySchedule {
            facility: self.facility,
            slot_duration_minutes: self.slot_duration_minutes,
            day_schedules: Vec::with_capacity(self.days.len()),
        };

        for (day, upstream) in self.days {
            let busy_slots = upstream
                .busy_slots
                .unwrap_or_default()
                .into_iter()
                .map(|slot| {
                    Ok(BusySlot {
                        start: parse_timestamp(&slot.start, offset)?,
                        end: parse_timestamp(&slot.end, offset)?,
                    })
                })
                .collect::<Result<Vec<_>, SchedulingApiError>>()?;

            schedule.insert_day(day, DaySchedule {
                work_period: upstream.work_period,
                busy_slots,
            });
        }

        Ok(schedule)
    }
}

/// RFC 3339 timestamps keep their offset; naive ones are read in the week's offset.
fn parse_timestamp(raw: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SchedulingApiError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp);
    }

    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| SchedulingApiError::InvalidPayload(format!("invalid timestamp '{}': {}", raw, e)))?;

    with_offset(local, offset)
        .ok_or_else(|| SchedulingApiError::InvalidPayload(format!("timestamp '{}' is out of range", raw)))
}
