//! Time utilities: timezone-aware task dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{EngineError, EngineResult};

/// Parse a task date coming from an export.
///
/// Accepts RFC 3339 (`2026-03-01T09:00:00Z`), a local `2026-03-01 09:00`, or a
/// bare `2026-03-01` (local midnight). Local forms are read in the IANA
/// timezone `tz` and returned as UTC.
pub fn parse_task_datetime(raw: &str, tz: &str) -> EngineResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let tz: Tz = tz.parse().map_err(|_| EngineError::InvalidTimezone {
        tz: tz.to_string(),
    })?;

    let ndt = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| EngineError::InvalidDatetime {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

    let local = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| EngineError::InvalidDatetime {
            raw: raw.to_string(),
            reason: format!("ambiguous or nonexistent local time in {tz}"),
        })?;

    Ok(local.with_timezone(&Utc))
}

/// Whole days elapsed from `start` to `due` (partial days are dropped).
pub fn whole_days_between(start: DateTime<Utc>, due: DateTime<Utc>) -> i64 {
    (due - start).num_days()
}
