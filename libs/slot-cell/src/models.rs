use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, Utc, Weekday};
use serde::{Deserialize, Serialize, Serializer};
use validator::{Validate, ValidationError};

// ==============================================================================
// UPSTREAM SCHEDULE (what the scheduling service reports for a week)
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct Facility {
    pub facility_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Opening hours of a facility for one day, in whole hours of facility-local time.
/// `[lunch_start_hour, lunch_end_hour)` is never bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkPeriod {
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default)]
    pub lunch_start_hour: u32,
    #[serde(default)]
    pub lunch_end_hour: u32,
}

/// Half-open `[start, end)` span that is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusySlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DaySchedule {
    pub work_period: Option<WorkPeriod>,
    pub busy_slots: Vec<BusySlot>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeeklyBusySchedule {
    pub facility: Option<Facility>,
    pub slot_duration_minutes: i64,
    /// Days in the order the scheduling service reported them, at most one entry per weekday.
    pub day_schedules: Vec<(Weekday, DaySchedule)>,
}

impl WeeklyBusySchedule {
    /// Adds a day, replacing an earlier entry for the same weekday in place.
    pub fn insert_day(&mut self, day: Weekday, schedule: DaySchedule) {
        match self.day_schedules.iter_mut().find(|(existing, _)| *existing == day) {
            Some(entry) => entry.1 = schedule,
            None => self.day_schedules.push((day, schedule)),
        }
    }

    pub fn with_day(mut self, day: Weekday, schedule: DaySchedule) -> Self {
        self.insert_day(day, schedule);
        self
    }
}

// ==============================================================================
// COMPUTED AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    #[serde(serialize_with = "serialize_weekday")]
    pub day_of_week: Weekday,
    pub available_slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAvailability {
    pub facility: Facility,
    pub week_start_date: DateTime<FixedOffset>,
    pub day_schedules: Vec<DayAvailability>,
}

impl WeeklyAvailability {
    pub fn day(&self, day: Weekday) -> Option<&DayAvailability> {
        self.day_schedules.iter().find(|d| d.day_of_week == day)
    }

    pub fn total_slots(&self) -> usize {
        self.day_schedules.iter().map(|d| d.available_slots.len()).sum()
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_slot_window"))]
pub struct BookSlotRequest {
    #[validate(length(min = 1, message = "FacilityId is required."))]
    pub facility_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default)]
    pub comments: Option<String>,
    #[validate(nested)]
    pub patient: PatientInfo,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[validate(length(min = 1, message = "Patient name is required."))]
    pub name: String,
    #[serde(default)]
    pub second_name: String,
    #[validate(email(message = "Patient email is invalid."))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

fn validate_slot_window(request: &BookSlotRequest) -> Result<(), ValidationError> {
    if request.start >= request.end {
        return Err(slot_window_error("start_after_end", "Slot start should be before end."));
    }

    if request.start <= Utc::now() {
        return Err(slot_window_error("start_in_past", "Slot start should be in the future."));
    }

    Ok(())
}

fn slot_window_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Booking payload in the scheduling service's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlotBooking {
    pub facility_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub comments: Option<String>,
    pub patient: Patient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Patient {
    pub name: String,
    pub second_name: String,
    pub email: String,
    pub phone: String,
}

impl From<BookSlotRequest> for SlotBooking {
    fn from(request: BookSlotRequest) -> Self {
        Self {
            facility_id: request.facility_id,
            start: request.start,
            end: request.end,
            comments: request.comments,
            patient: Patient {
                name: request.patient.name,
                second_name: request.patient.second_name,
                email: request.patient.email,
                phone: request.patient.phone,
            },
        }
    }
}

// ==============================================================================
// WEEKDAY NAMES
// ==============================================================================

pub fn weekday_name(day: &Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Maps an English day name (any case) to a weekday. Abbreviations are not day keys.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn serialize_weekday<S>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(weekday_name(day))
}
