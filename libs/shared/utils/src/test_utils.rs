use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub slot_service_base_url: String,
    pub slot_service_username: String,
    pub slot_service_password: String,
    pub facility_utc_offset: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            slot_service_base_url: "http://localhost:54321".to_string(),
            slot_service_username: "techuser".to_string(),
            slot_service_password: "secretpassWord".to_string(),
            facility_utc_offset: "+00:00".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            slot_service_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            slot_service_base_url: self.slot_service_base_url.clone(),
            slot_service_username: self.slot_service_username.clone(),
            slot_service_password: self.slot_service_password.clone(),
            slot_service_timeout_secs: 5,
            facility_utc_offset: self.facility_utc_offset.clone(),
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Builds weekly availability payloads in the scheduling service's wire format.
pub struct UpstreamScheduleFixture {
    body: Map<String, Value>,
}

impl UpstreamScheduleFixture {
    pub fn new(slot_duration_minutes: i64) -> Self {
        let mut body = Map::new();
        body.insert("Facility".to_string(), json!({
            "FacilityId": Uuid::nil().to_string(),
            "Name": "Simple Test Facility",
            "Address": "123 Test St"
        }));
        body.insert("SlotDurationMinutes".to_string(), json!(slot_duration_minutes));

        Self { body }
    }

    pub fn without_facility(mut self) -> Self {
        self.body.remove("Facility");
        self
    }

    /// Adds a day; `busy` holds `(start, end)` timestamps as the upstream sends them.
    pub fn with_day(
        mut self,
        day: &str,
        work_period: (u32, u32, u32, u32),
        busy: &[(&str, &str)],
    ) -> Self {
        let (start_hour, end_hour, lunch_start_hour, lunch_end_hour) = work_period;
        let busy_slots: Vec<Value> = busy
            .iter()
            .map(|(start, end)| json!({ "Start": start, "End": end }))
            .collect();

        self.body.insert(day.to_string(), json!({
            "WorkPeriod": {
                "StartHour": start_hour,
                "EndHour": end_hour,
                "LunchStartHour": lunch_start_hour,
                "LunchEndHour": lunch_end_hour
            },
            "BusySlots": busy_slots
        }));
        self
    }

    pub fn with_entry(mut self, key: &str, value: Value) -> Self {
        self.body.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.body)
    }
}
