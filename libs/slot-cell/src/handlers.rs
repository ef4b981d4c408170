use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::ValidatedJson;

use crate::models::{BookSlotRequest, WeeklyAvailability};
use crate::services::availability::start_of_day;
use crate::services::SlotService;

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<String>,
) -> Result<Json<WeeklyAvailability>, AppError> {
    let week_start = parse_week_start(&date, state.facility_offset())?;

    let slot_service = SlotService::new(&state)?;
    let availability = slot_service.get_available_slots(week_start).await?;

    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppConfig>>,
    ValidatedJson(request): ValidatedJson<BookSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let slot_service = SlotService::new(&state)?;
    slot_service.book_slot(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Slot booked"
    }))))
}

/// Accepts `YYYY-MM-DD` (midnight in the facility offset) or an RFC 3339 timestamp,
/// which the service reads in the facility offset.
fn parse_week_start(raw: &str, facility_offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppError> {
    let invalid = || AppError::ValidationError(format!("'{}' is not a valid date", raw));

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return start_of_day(date, facility_offset).ok_or_else(invalid);
    }

    DateTime::parse_from_rfc3339(raw).map_err(|_| invalid())
}
