//! Reveal schedule evaluation.
//!
//! Pure functions over `(schedule, now)`. Reveal state is never stored anywhere; every caller
//! recomputes it from the instant it sampled.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::tile::TileDescriptor;

/// Offset-less layouts, interpreted in the caller's zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Layouts with an explicit numeric offset that RFC 3339 parsing does not cover.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealState {
    Locked,
    Revealed,
    /// `reveal_at` did not parse. Permanently locked.
    InvalidSchedule,
}

impl RevealState {
    pub fn is_revealed(self) -> bool {
        self == Self::Revealed
    }
}

/// Parses a schedule timestamp, reading offset-less forms as local time.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_instant_in(raw, &Local)
}

/// Parses a schedule timestamp, reading offset-less forms in `zone`.
///
/// Accepted: RFC 3339 (`Z` or numeric offset, `T` or space separator), the same without
/// seconds, offset-less date-times, and bare dates (UTC midnight). Anything else is `None`.
pub fn parse_instant_in<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
        return parse_naive(utc).map(|naive| naive.and_utc());
    }
    if let Some(naive) = parse_naive(raw) {
        // Local times inside a DST gap have no instant; they count as malformed.
        return zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn reveal_state(tile: &TileDescriptor, now: DateTime<Utc>) -> RevealState {
    match tile.reveal_instant() {
        None => RevealState::InvalidSchedule,
        Some(at) if now >= at => RevealState::Revealed,
        Some(_) => RevealState::Locked,
    }
}

/// Closed boundary: a tile is revealed at exactly its scheduled instant.
pub fn is_revealed(tile: &TileDescriptor, now: DateTime<Utc>) -> bool {
    reveal_state(tile, now).is_revealed()
}

/// Time left until `reveal_at`, clamped to zero once it has passed.
pub fn remaining(reveal_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (reveal_at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Index of the first tile, in configuration order, that is not yet revealed.
pub fn find_next_locked(tiles: &[TileDescriptor], now: DateTime<Utc>) -> Option<usize> {
    tiles.iter().position(|tile| !is_revealed(tile, now))
}

/// The soonest upcoming reveal among tiles with a valid schedule.
pub fn next_reveal(tiles: &[TileDescriptor], now: DateTime<Utc>) -> Option<(usize, DateTime<Utc>)> {
    tiles
        .iter()
        .enumerate()
        .filter_map(|(i, tile)| tile.reveal_instant().map(|at| (i, at)))
        .filter(|&(_, at)| at > now)
        .min_by_key(|&(i, at)| (at, i))
}
