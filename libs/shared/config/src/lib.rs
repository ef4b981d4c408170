use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slot_service_base_url: String,
    pub slot_service_username: String,
    pub slot_service_password: String,
    pub slot_service_timeout_secs: u64,
    /// UTC offset of the facility, e.g. `+02:00`. Plain dates are anchored here.
    pub facility_utc_offset: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            slot_service_base_url: env::var("SLOT_SERVICE_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SLOT_SERVICE_BASE_URL not set, using empty value");
                    String::new()
                }),
            slot_service_username: env::var("SLOT_SERVICE_USERNAME")
                .unwrap_or_else(|_| {
                    warn!("SLOT_SERVICE_USERNAME not set, using empty value");
                    String::new()
                }),
            slot_service_password: env::var("SLOT_SERVICE_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("SLOT_SERVICE_PASSWORD not set, using empty value");
                    String::new()
                }),
            slot_service_timeout_secs: env::var("SLOT_SERVICE_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SLOT_SERVICE_TIMEOUT_SECS not set or invalid, using default");
                    DEFAULT_TIMEOUT_SECS
                }),
            facility_utc_offset: env::var("FACILITY_UTC_OFFSET")
                .unwrap_or_else(|_| {
                    warn!("FACILITY_UTC_OFFSET not set, using UTC");
                    "+00:00".to_string()
                }),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
        };

        if !config.is_configured() {
            warn!("Slot service not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.slot_service_base_url.is_empty()
            && !self.slot_service_username.is_empty()
            && !self.slot_service_password.is_empty()
    }

    /// Parses `facility_utc_offset`, falling back to UTC when it is malformed.
    pub fn facility_offset(&self) -> FixedOffset {
        parse_utc_offset(&self.facility_utc_offset).unwrap_or_else(|| {
            warn!("Invalid FACILITY_UTC_OFFSET '{}', using UTC", self.facility_utc_offset);
            Utc.fix()
        })
    }
}

/// Parses `Z` or a numeric offset such as `+02:00`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return Some(Utc.fix());
    }

    raw.parse::<FixedOffset>().ok()
}
