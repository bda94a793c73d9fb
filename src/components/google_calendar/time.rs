use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use super::models::EventDateTime;
use crate::error::{event_parse_error, HatResult};

/// Format an instant the way the `timeMin` filter expects it
pub fn format_time_min(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Look up an IANA zone name
pub fn parse_zone(name: &str) -> HatResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| event_parse_error(&format!("Unknown time zone: {}", name)))
}

/// Place a wall-clock reading in `tz`.
///
/// Ambiguous readings (clocks going back) take the earlier instant; readings
/// inside a gap (clocks going forward) are moved past the gap.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> HatResult<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| event_parse_error(&format!("Invalid local time {} in {}", naive, tz))),
    }
}

/// Resolve the start or end of an event to an instant.
///
/// The wall-clock reading of `dateTime` is kept and the event's own
/// `timeZone` is applied to it, replacing any offset in the string. Without
/// a `timeZone` the string's offset stands. All-day entries resolve to
/// midnight in the event zone, else `calendar_zone`, else UTC.
pub fn resolve_instant(
    when: &EventDateTime,
    calendar_zone: Option<&str>,
) -> HatResult<DateTime<FixedOffset>> {
    let event_zone = when.time_zone.as_deref().map(parse_zone).transpose()?;

    if let Some(raw) = &when.date_time {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return match event_zone {
                Some(tz) => Ok(localize(tz, parsed.naive_local())?.fixed_offset()),
                None => Ok(parsed),
            };
        }

        // Offset-less timestamps only make sense with a zone to put them in
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| event_parse_error(&format!("Failed to parse datetime {}: {}", raw, e)))?;
        let tz = match event_zone {
            Some(tz) => tz,
            None => calendar_zone
                .map(parse_zone)
                .transpose()?
                .ok_or_else(|| event_parse_error(&format!("No time zone for {}", raw)))?,
        };
        return Ok(localize(tz, naive)?.fixed_offset());
    }

    if let Some(raw) = &when.date {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| event_parse_error(&format!("Failed to parse date {}: {}", raw, e)))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| event_parse_error("Failed to create datetime"))?;
        let tz = match event_zone {
            Some(tz) => tz,
            None => calendar_zone.map(parse_zone).transpose()?.unwrap_or(Tz::UTC),
        };
        return Ok(localize(tz, midnight)?.fixed_offset());
    }

    Err(event_parse_error("Event time has neither dateTime nor date"))
}
