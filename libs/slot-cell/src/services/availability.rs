use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Weekday,
};
use tracing::debug;

use crate::error::SlotError;
use crate::models::{
    weekday_name, AvailableSlot, BusySlot, DayAvailability, DaySchedule, WeeklyAvailability,
    WeeklyBusySchedule, WorkPeriod,
};

const HOURS_PER_DAY: u32 = 24;

/// Turns a week of busy slots into the free slots of every reported day.
///
/// Days keep the order the scheduling service reported them in; days it did not
/// report are not synthesized. A reported day without a work period aborts the
/// whole computation.
pub fn compute_weekly_availability(
    schedule: &WeeklyBusySchedule,
    week_start: DateTime<FixedOffset>,
) -> Result<WeeklyAvailability, SlotError> {
    let facility = schedule.facility.clone().ok_or(SlotError::MissingFacility)?;

    if schedule.slot_duration_minutes <= 0 {
        return Err(SlotError::InvalidSchedule(format!(
            "slot duration must be positive, got {} minutes",
            schedule.slot_duration_minutes
        )));
    }
    let slot_duration = Duration::try_minutes(schedule.slot_duration_minutes).ok_or_else(|| {
        SlotError::InvalidSchedule(format!(
            "slot duration of {} minutes is out of range",
            schedule.slot_duration_minutes
        ))
    })?;

    let mut day_schedules = Vec::with_capacity(schedule.day_schedules.len());

    for (day_of_week, day_schedule) in &schedule.day_schedules {
        let date = date_for_weekday(week_start, *day_of_week).ok_or_else(|| {
            SlotError::InvalidSchedule(format!(
                "{} of the week of {} is out of range",
                weekday_name(day_of_week),
                week_start
            ))
        })?;
        let available_slots = available_slots_for_day(*day_of_week, day_schedule, date, slot_duration)?;

        debug!(
            "{} slots available on {} ({})",
            available_slots.len(),
            weekday_name(day_of_week),
            date.date_naive()
        );

        day_schedules.push(DayAvailability {
            day_of_week: *day_of_week,
            available_slots,
        });
    }

    Ok(WeeklyAvailability {
        facility,
        week_start_date: week_start,
        day_schedules,
    })
}

/// Steps through the work period in `slot_duration` increments.
///
/// The last candidate only needs to *start* before the end hour, so it may run
/// past closing time.
pub fn available_slots_for_day(
    day_of_week: Weekday,
    day_schedule: &DaySchedule,
    date: DateTime<FixedOffset>,
    slot_duration: Duration,
) -> Result<Vec<AvailableSlot>, SlotError> {
    let work_period = day_schedule
        .work_period
        .ok_or(SlotError::MissingWorkPeriod(day_of_week))?;

    if work_period.start_hour > HOURS_PER_DAY || work_period.end_hour > HOURS_PER_DAY {
        return Err(SlotError::InvalidSchedule(format!(
            "work period {}-{} on {} is outside a day",
            work_period.start_hour,
            work_period.end_hour,
            weekday_name(&day_of_week)
        )));
    }

    let out_of_range = || {
        SlotError::InvalidSchedule(format!(
            "slots on {} run past the supported date range",
            weekday_name(&day_of_week)
        ))
    };

    let day_start = start_of_day(date.date_naive(), *date.offset()).ok_or_else(out_of_range)?;
    let end_time = at_hour(day_start, work_period.end_hour).ok_or_else(out_of_range)?;

    let mut slot_start = at_hour(day_start, work_period.start_hour).ok_or_else(out_of_range)?;
    let mut available_slots = Vec::new();

    while slot_start < end_time {
        let slot_end = slot_start
            .checked_add_signed(slot_duration)
            .ok_or_else(out_of_range)?;

        if is_slot_available(slot_start, slot_end, &work_period, &day_schedule.busy_slots) {
            available_slots.push(AvailableSlot {
                start: slot_start,
                end: slot_end,
            });
        }

        slot_start = slot_end;
    }

    Ok(available_slots)
}

fn at_hour(day_start: DateTime<FixedOffset>, hour: u32) -> Option<DateTime<FixedOffset>> {
    day_start.checked_add_signed(Duration::try_hours(i64::from(hour))?)
}

/// Lunch is checked on the slot's start hour only.
pub fn is_slot_available(
    slot_start: DateTime<FixedOffset>,
    slot_end: DateTime<FixedOffset>,
    work_period: &WorkPeriod,
    busy_slots: &[BusySlot],
) -> bool {
    let hour = slot_start.hour();
    let is_lunch_time = hour >= work_period.lunch_start_hour && hour < work_period.lunch_end_hour;
    if is_lunch_time {
        return false;
    }

    !busy_slots
        .iter()
        .any(|busy| slots_overlap(busy.start, busy.end, slot_start, slot_end))
}

/// Half-open interval overlap.
pub fn slots_overlap(
    start1: DateTime<FixedOffset>,
    end1: DateTime<FixedOffset>,
    start2: DateTime<FixedOffset>,
    end2: DateTime<FixedOffset>,
) -> bool {
    start1 < end2 && end1 > start2
}

pub fn date_for_weekday(week_start: DateTime<FixedOffset>, day: Weekday) -> Option<DateTime<FixedOffset>> {
    week_start.checked_add_days(Days::new(u64::from(day.num_days_from_monday())))
}

/// Midnight of the Monday starting the week that contains `instant`, in the same offset.
pub fn week_start_for(instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let days_from_monday = u64::from(instant.weekday().num_days_from_monday());
    let monday = instant.date_naive().checked_sub_days(Days::new(days_from_monday))?;

    start_of_day(monday, *instant.offset())
}

pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    with_offset(date.and_time(NaiveTime::MIN), offset)
}

/// Reads a wall-clock time as local time in `offset`.
pub fn with_offset(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.from_local_datetime(&local).single()
}
