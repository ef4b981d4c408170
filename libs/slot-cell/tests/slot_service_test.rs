use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Weekday};
use mockall::{mock, predicate::eq};

use shared_database::SchedulingApiError;
use slot_cell::{
    BookSlotRequest, BusySlot, DaySchedule, Facility, PatientInfo, SlotBooking, SlotError,
    SlotRepository, SlotService, WeeklyBusySchedule, WorkPeriod,
};

mock! {
    pub Repository {}

    #[async_trait]
    impl SlotRepository for Repository {
        async fn fetch_weekly_busy_schedule(
            &self,
            week_start: DateTime<FixedOffset>,
        ) -> Result<Option<WeeklyBusySchedule>, SchedulingApiError>;

        async fn submit_booking(&self, booking: &SlotBooking) -> Result<(), SchedulingApiError>;
    }
}

fn at(timestamp: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(timestamp).unwrap()
}

fn monday() -> DateTime<FixedOffset> {
    at("2024-07-29T00:00:00+00:00")
}

fn busy(start: &str, end: &str) -> BusySlot {
    BusySlot {
        start: at(start),
        end: at(end),
    }
}

/// Monday 09:00-10:00 in 10 minute slots, the first two taken.
fn weekly_schedule() -> WeeklyBusySchedule {
    WeeklyBusySchedule {
        facility: Some(Facility {
            facility_id: "facility-1".to_string(),
            name: Some("Simple Test Facility".to_string()),
            address: None,
        }),
        slot_duration_minutes: 10,
        day_schedules: Vec::new(),
    }
    .with_day(Weekday::Mon, DaySchedule {
        work_period: Some(WorkPeriod {
            start_hour: 9,
            end_hour: 10,
            lunch_start_hour: 0,
            lunch_end_hour: 0,
        }),
        busy_slots: vec![
            busy("2024-07-29T09:00:00+00:00", "2024-07-29T09:10:00+00:00"),
            busy("2024-07-29T09:10:00+00:00", "2024-07-29T09:20:00+00:00"),
        ],
    })
}

fn booking_request(start: &str, end: &str) -> BookSlotRequest {
    BookSlotRequest {
        facility_id: "facility-1".to_string(),
        start: at(start),
        end: at(end),
        comments: Some("First visit".to_string()),
        patient: PatientInfo {
            name: "Mario".to_string(),
            second_name: "Neta".to_string(),
            email: "mario@neta.com".to_string(),
            phone: "555 44 33 22".to_string(),
        },
    }
}

fn repository_with_schedule(schedule: Option<WeeklyBusySchedule>) -> MockRepository {
    let mut repository = MockRepository::new();
    repository
        .expect_fetch_weekly_busy_schedule()
        .with(eq(monday()))
        .times(1)
        .returning(move |_| Ok(schedule.clone()));
    repository
}

#[tokio::test]
async fn test_get_available_slots() {
    let repository = repository_with_schedule(Some(weekly_schedule()));
    let service = SlotService::with_repository(Arc::new(repository));

    let availability = service.get_available_slots(monday()).await.unwrap();

    let day = availability.day(Weekday::Mon).unwrap();
    assert_eq!(day.available_slots.len(), 4);
    assert_eq!(day.available_slots[0].start, at("2024-07-29T09:20:00+00:00"));
    assert_eq!(availability.facility.facility_id, "facility-1");
}

#[tokio::test]
async fn test_get_available_slots_requires_monday() {
    // No expectations: any repository call fails the test.
    let service = SlotService::with_repository(Arc::new(MockRepository::new()));

    let result = service.get_available_slots(at("2024-07-30T00:00:00+00:00")).await;

    assert_matches!(result, Err(SlotError::Validation(message)) if message == "The date should be a Monday.");
}

#[tokio::test]
async fn test_get_available_slots_without_schedule() {
    let repository = repository_with_schedule(None);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service.get_available_slots(monday()).await;

    assert_matches!(result, Err(SlotError::MissingSchedule));
}

#[tokio::test]
async fn test_get_available_slots_without_facility() {
    let mut schedule = weekly_schedule();
    schedule.facility = None;
    let repository = repository_with_schedule(Some(schedule));
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service.get_available_slots(monday()).await;

    assert_matches!(result, Err(SlotError::MissingFacility));
}

#[tokio::test]
async fn test_get_available_slots_upstream_failure() {
    let mut repository = MockRepository::new();
    repository
        .expect_fetch_weekly_busy_schedule()
        .times(1)
        .returning(|_| Err(SchedulingApiError::Status { status: 500, body: "boom".to_string() }));
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service.get_available_slots(monday()).await;

    assert_matches!(result, Err(SlotError::Upstream(SchedulingApiError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_book_free_slot() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository
        .expect_submit_booking()
        .withf(|booking| {
            booking.facility_id == "facility-1"
                && booking.start == at("2024-07-29T09:20:00+00:00")
                && booking.end == at("2024-07-29T09:30:00+00:00")
                && booking.comments.as_deref() == Some("First visit")
                && booking.patient.name == "Mario"
                && booking.patient.email == "mario@neta.com"
        })
        .times(1)
        .returning(|_| Ok(()));
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:20:00+00:00", "2024-07-29T09:30:00+00:00"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_book_slot_looks_up_week_of_request() {
    // Friday booking still loads the schedule of Monday 2024-07-29.
    let schedule = weekly_schedule().with_day(Weekday::Fri, DaySchedule {
        work_period: Some(WorkPeriod {
            start_hour: 12,
            end_hour: 13,
            lunch_start_hour: 0,
            lunch_end_hour: 0,
        }),
        busy_slots: vec![],
    });
    let mut repository = repository_with_schedule(Some(schedule));
    repository.expect_submit_booking().times(1).returning(|_| Ok(()));
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-08-02T12:40:00+00:00", "2024-08-02T12:50:00+00:00"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_book_busy_slot_is_rejected() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository.expect_submit_booking().times(0);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:10:00+00:00", "2024-07-29T09:20:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::SlotNotAvailable));
}

#[tokio::test]
async fn test_book_misaligned_slot_is_rejected() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository.expect_submit_booking().times(0);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:15:00+00:00", "2024-07-29T09:25:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::SlotNotAvailable));
}

#[tokio::test]
async fn test_book_span_of_two_slots_is_rejected() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository.expect_submit_booking().times(0);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:20:00+00:00", "2024-07-29T09:40:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::SlotNotAvailable));
}

#[tokio::test]
async fn test_book_on_unreported_day_is_rejected() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository.expect_submit_booking().times(0);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-30T09:20:00+00:00", "2024-07-30T09:30:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::SlotNotAvailable));
}

#[tokio::test]
async fn test_book_slot_store_failure() {
    let mut repository = repository_with_schedule(Some(weekly_schedule()));
    repository
        .expect_submit_booking()
        .times(1)
        .returning(|_| Err(SchedulingApiError::Status { status: 503, body: "unavailable".to_string() }));
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:50:00+00:00", "2024-07-29T10:00:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::BookingFailed(SchedulingApiError::Status { status: 503, .. })));
}

#[tokio::test]
async fn test_book_slot_without_schedule() {
    let mut repository = repository_with_schedule(None);
    repository.expect_submit_booking().times(0);
    let service = SlotService::with_repository(Arc::new(repository));

    let result = service
        .book_slot(booking_request("2024-07-29T09:20:00+00:00", "2024-07-29T09:30:00+00:00"))
        .await;

    assert_matches!(result, Err(SlotError::MissingSchedule));
}

fn plus_two() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

#[tokio::test]
async fn test_book_slot_written_in_another_offset() {
    // Facility at +02:00 offers 09:00+02:00, booked here as 07:00Z.
    let mut repository = MockRepository::new();
    repository
        .expect_fetch_weekly_busy_schedule()
        .withf(|week_start| {
            *week_start == at("2024-07-29T00:00:00+02:00") && week_start.offset() == &plus_two()
        })
        .times(1)
        .returning(|_| Ok(Some(weekly_schedule())));
    repository
        .expect_submit_booking()
        .withf(|booking| booking.start == at("2024-07-29T09:00:00+02:00"))
        .times(1)
        .returning(|_| Ok(()));
    let service = SlotService::with_repository(Arc::new(repository)).with_facility_offset(plus_two());

    let result = service
        .book_slot(booking_request("2024-07-29T07:00:00+00:00", "2024-07-29T07:10:00+00:00"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_work_hours_follow_facility_offset() {
    let mut repository = MockRepository::new();
    repository
        .expect_fetch_weekly_busy_schedule()
        .with(eq(at("2024-07-29T00:00:00+02:00")))
        .times(1)
        .returning(|_| Ok(Some(weekly_schedule())));
    let service = SlotService::with_repository(Arc::new(repository)).with_facility_offset(plus_two());

    // Sunday 23:00Z is already Monday at the facility.
    let availability = service
        .get_available_slots(at("2024-07-28T23:00:00+00:00"))
        .await
        .unwrap();

    let first = availability.day(Weekday::Mon).unwrap().available_slots[0];
    assert_eq!(first.start, at("2024-07-29T09:00:00+02:00"));
    assert_eq!(first.start.offset(), &plus_two());
    assert_eq!(availability.week_start_date.offset(), &plus_two());
}

#[tokio::test]
async fn test_monday_is_judged_in_facility_offset() {
    let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
    let service = SlotService::with_repository(Arc::new(MockRepository::new()))
        .with_facility_offset(minus_five);

    // Monday 00:00Z is still Sunday evening at the facility.
    let result = service.get_available_slots(monday()).await;

    assert_matches!(result, Err(SlotError::Validation(_)));
}
