use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::models::EventList;
use crate::error::{transport_error, HatResult};

/// Parameters of one `events.list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Lower bound on event end, `timeMin` format
    pub time_min: String,
    pub max_results: u32,
    /// Expand recurring events into single occurrences
    pub single_events: bool,
    pub order_by: String,
}

impl EventQuery {
    /// Upcoming single occurrences from `time_min` on, ordered by start
    pub fn upcoming(time_min: String, max_results: u32) -> Self {
        Self {
            time_min,
            max_results,
            single_events: true,
            order_by: "startTime".to_string(),
        }
    }
}

/// Remote side that lists calendar events
#[async_trait]
pub trait CalendarTransport: Send + Sync {
    async fn list_events(&self, query: &EventQuery) -> HatResult<EventList>;
}

/// Calendar v3 REST transport bound to one calendar and one access token
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_base: String,
    calendar_id: String,
    access_token: String,
}

impl HttpTransport {
    pub fn new(api_base: &str, calendar_id: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Build the request URL for `query`
    pub fn events_url(&self, query: &EventQuery) -> HatResult<Url> {
        let mut url = Url::parse(&format!("{}/calendars/", self.api_base))
            .map_err(|e| transport_error(&format!("Failed to parse URL: {}", e)))?;

        // The calendar id is usually an email address and needs escaping
        url.path_segments_mut()
            .map_err(|_| transport_error("API base URL cannot hold a path"))?
            .pop_if_empty()
            .push(&self.calendar_id)
            .push("events");

        url.query_pairs_mut()
            .append_pair("timeMin", &query.time_min)
            .append_pair("maxResults", &query.max_results.to_string())
            .append_pair("singleEvents", &query.single_events.to_string())
            .append_pair("orderBy", &query.order_by);

        Ok(url)
    }
}

#[async_trait]
impl CalendarTransport for HttpTransport {
    async fn list_events(&self, query: &EventQuery) -> HatResult<EventList> {
        let url = self.events_url(query)?;
        debug!("Listing events: {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(transport_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json::<EventList>()
            .await
            .map_err(|e| transport_error(&format!("Failed to parse events response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url() {
        let transport = HttpTransport::new(
            "https://www.googleapis.com/calendar/v3/",
            "someone@example.com",
            "token",
        );
        let query = EventQuery::upcoming("2024-05-01T08:00:00.000000Z".to_string(), 5);
        let url = transport.events_url(&query).unwrap();

        assert_eq!(
            url.path(),
            "/calendar/v3/calendars/someone@example.com/events"
        );
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("timeMin".to_string(), "2024-05-01T08:00:00.000000Z".to_string()),
                ("maxResults".to_string(), "5".to_string()),
                ("singleEvents".to_string(), "true".to_string()),
                ("orderBy".to_string(), "startTime".to_string()),
            ]
        );
    }

    #[test]
    fn test_calendar_id_is_escaped() {
        let transport = HttpTransport::new("https://example.com/v3", "team#holidays", "token");
        let query = EventQuery::upcoming("t".to_string(), 1);
        let url = transport.events_url(&query).unwrap();
        assert_eq!(url.path(), "/v3/calendars/team%23holidays/events");
    }
}
