use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Shown in place of a reveal instant when the schedule did not parse.
pub const INVALID_TIME_LABEL: &str = "Invalid time";

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Formats time remaining at the coarsest useful granularity.
///
/// Fractional seconds are floored. At a day or more the seconds are dropped; under an hour
/// the hours are dropped, so zero renders as `0m 0s`.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let days = total / SECS_PER_DAY;
    let hours = total % SECS_PER_DAY / SECS_PER_HOUR;
    let minutes = total % SECS_PER_HOUR / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Like [`format_countdown`] for a signed delta; negative drift renders as zero.
pub fn format_countdown_delta(delta: TimeDelta) -> String {
    format_countdown(delta.to_std().unwrap_or(Duration::ZERO))
}

/// Zone used when showing reveal instants to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

pub fn format_reveal_instant(instant: Option<DateTime<Utc>>, zone: DisplayZone) -> String {
    let Some(instant) = instant else {
        return INVALID_TIME_LABEL.to_string();
    };
    match zone {
        DisplayZone::Local => instant
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        DisplayZone::Utc => instant.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}
