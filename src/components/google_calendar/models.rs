use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::time::resolve_instant;
use crate::error::HatResult;

/// Event type of regular calendar entries; everything else (out of office,
/// focus time, working location) is filtered out on fetch
pub const DEFAULT_EVENT_TYPE: &str = "default";

fn default_event_type() -> String {
    DEFAULT_EVENT_TYPE.to_string()
}

/// Start or end of an event as the API reports it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp, set for timed events
    pub date_time: Option<String>,
    /// `YYYY-MM-DD`, set for all-day events
    pub date: Option<String>,
    /// IANA zone name the timestamp is expressed in
    pub time_zone: Option<String>,
}

/// Calendar event exactly as listed by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    /// Remaining fields of the record, kept untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    pub fn is_default(&self) -> bool {
        self.event_type == DEFAULT_EVENT_TYPE
    }
}

/// Response envelope of `events.list`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<RawEvent>,
    /// Time zone of the calendar itself
    pub time_zone: Option<String>,
    pub next_page_token: Option<String>,
}

/// A fetched event annotated with its resolved start and end instants.
///
/// Only [`Event::annotate`] builds one, so the instants are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    raw: RawEvent,
    start_at: DateTime<FixedOffset>,
    end_at: DateTime<FixedOffset>,
}

impl Event {
    /// Resolve both instants of `raw`; `calendar_zone` is used for
    /// timestamps that do not name a zone of their own.
    pub fn annotate(raw: RawEvent, calendar_zone: Option<&str>) -> HatResult<Self> {
        let start_at = resolve_instant(&raw.start, calendar_zone)?;
        let end_at = resolve_instant(&raw.end, calendar_zone)?;
        Ok(Self { raw, start_at, end_at })
    }

    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn summary(&self) -> Option<&str> {
        self.raw.summary.as_deref()
    }

    pub fn event_type(&self) -> &str {
        &self.raw.event_type
    }

    pub fn start_at(&self) -> DateTime<FixedOffset> {
        self.start_at
    }

    pub fn end_at(&self) -> DateTime<FixedOffset> {
        self.end_at
    }

    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_list_without_items() {
        let list: EventList = serde_json::from_value(json!({
            "kind": "calendar#events",
            "summary": "someone@example.com"
        }))
        .unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_raw_event_keeps_unknown_fields() {
        let raw: RawEvent = serde_json::from_value(json!({
            "id": "abc",
            "eventType": "outOfOffice",
            "location": "Home",
            "start": { "dateTime": "2024-05-01T10:00:00+03:00", "timeZone": "Europe/Helsinki" },
            "end": { "dateTime": "2024-05-01T11:00:00+03:00", "timeZone": "Europe/Helsinki" }
        }))
        .unwrap();
        assert!(!raw.is_default());
        assert_eq!(raw.extra.get("location"), Some(&json!("Home")));
        assert_eq!(raw.start.time_zone.as_deref(), Some("Europe/Helsinki"));
    }

    #[test]
    fn test_missing_event_type_counts_as_default() {
        let raw: RawEvent = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        assert!(raw.is_default());
    }

    #[test]
    fn test_annotate_sets_both_instants() {
        let raw: RawEvent = serde_json::from_value(json!({
            "id": "abc",
            "start": { "dateTime": "2024-05-01T10:00:00Z", "timeZone": "UTC" },
            "end": { "dateTime": "2024-05-01T11:30:00Z", "timeZone": "UTC" }
        }))
        .unwrap();
        let event = Event::annotate(raw, None).unwrap();
        assert_eq!(event.start_at().to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(event.end_at().to_rfc3339(), "2024-05-01T11:30:00+00:00");
    }
}
