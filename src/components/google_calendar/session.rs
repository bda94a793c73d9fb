use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use super::models::{Event, RawEvent};
use super::time::format_time_min;
use super::token::{Credential, CredentialStore, FileCredentialStore};
use super::transport::{CalendarTransport, EventQuery, HttpTransport};
use crate::config::Config;
use crate::error::{Error, HatResult};

/// Number of events fetched when the caller does not ask for more
pub const DEFAULT_FETCH_COUNT: u32 = 1;

/// Builds a transport for a calendar id once a credential is available
pub type TransportBuilder =
    Box<dyn Fn(&str, &Credential) -> Box<dyn CalendarTransport> + Send + Sync>;

/// One Google Calendar and the events last fetched from it
pub struct GoogleCalendar {
    calendar_id: String,
    store: Box<dyn CredentialStore>,
    build_transport: TransportBuilder,
    credential: Option<Credential>,
    transport: Option<Box<dyn CalendarTransport>>,
    events: Vec<Event>,
}

impl GoogleCalendar {
    /// Create a session talking to the Calendar REST API at `api_base`
    pub fn new(
        calendar_id: &str,
        store: impl CredentialStore + 'static,
        api_base: &str,
    ) -> Self {
        let api_base = api_base.to_string();
        Self::with_transport_builder(
            calendar_id,
            store,
            Box::new(
                move |calendar_id: &str, credential: &Credential| -> Box<dyn CalendarTransport> {
                    Box::new(HttpTransport::new(&api_base, calendar_id, &credential.token))
                },
            ),
        )
    }

    /// Create a session from the application config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.google_calendar_id,
            FileCredentialStore::new(config.token_path.clone()),
            &config.api_base,
        )
    }

    /// Create a session with a custom way of building transports
    pub fn with_transport_builder(
        calendar_id: &str,
        store: impl CredentialStore + 'static,
        build_transport: TransportBuilder,
    ) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            store: Box::new(store),
            build_transport,
            credential: None,
            transport: None,
            events: Vec::new(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Load the stored credential, renew it if it has run out, and bind a
    /// transport to this calendar.
    ///
    /// Fails with [`Error::CredentialsNotFound`] when the store is empty.
    pub async fn connect(&mut self) -> HatResult<()> {
        let mut credential = self.store.load().await?.ok_or_else(|| {
            Error::CredentialsNotFound("Calendar API credentials not found".to_string())
        })?;

        if credential.is_expired(Utc::now()) {
            if credential.has_refresh_token() {
                debug!("Stored access token expired, refreshing");
                self.store.refresh(&mut credential).await?;
            } else {
                warn!("Stored access token expired and cannot be refreshed");
            }
        }

        self.transport = Some((self.build_transport)(&self.calendar_id, &credential));
        self.credential = Some(credential);

        info!("Connected to calendar {}", self.calendar_id);
        Ok(())
    }

    /// Refresh the held credential on demand; does nothing before `connect`.
    ///
    /// The credential and transport are swapped together, so a failed
    /// refresh leaves both as they were.
    pub async fn refresh_credentials(&mut self) -> HatResult<()> {
        let Some(mut credential) = self.credential.clone() else {
            return Ok(());
        };

        self.store.refresh(&mut credential).await?;
        self.transport = Some((self.build_transport)(&self.calendar_id, &credential));
        self.credential = Some(credential);
        Ok(())
    }

    /// Fetch up to `count` upcoming events, replacing the stored ones.
    ///
    /// Only `"default"` events are kept. On failure the previously stored
    /// events stay as they were.
    pub async fn fetch(&mut self, count: u32) -> HatResult<()> {
        if count == 0 {
            return Err(Error::InvalidArgument(
                "event count must be at least 1".to_string(),
            ));
        }
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;

        let query = EventQuery::upcoming(format_time_min(Utc::now()), count);
        let list = transport.list_events(&query).await?;

        let received = list.items.len();
        let calendar_zone = list.time_zone;
        let events = list
            .items
            .into_iter()
            .filter(RawEvent::is_default)
            .map(|raw| Event::annotate(raw, calendar_zone.as_deref()))
            .collect::<HatResult<Vec<_>>>()?;

        info!(
            "Fetched {} events from {} ({} after filtering)",
            received,
            self.calendar_id,
            events.len()
        );
        self.events = events;
        Ok(())
    }

    /// Fetch the single next event
    pub async fn fetch_default(&mut self) -> HatResult<()> {
        self.fetch(DEFAULT_FETCH_COUNT).await
    }

    /// Events from the last successful fetch, in server order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get_event_starts(&self) -> Vec<DateTime<FixedOffset>> {
        self.events.iter().map(Event::start_at).collect()
    }

    pub fn get_event_ends(&self) -> Vec<DateTime<FixedOffset>> {
        self.events.iter().map(Event::end_at).collect()
    }

    /// Whether any stored event starts after the current time
    pub fn check_upcoming_events(&self) -> bool {
        self.check_upcoming_events_at(Utc::now())
    }

    pub fn check_upcoming_events_at(&self, now: DateTime<Utc>) -> bool {
        self.events.iter().any(|event| event.start_at() > now)
    }

    /// The stored event starting soonest after the current time.
    ///
    /// `Ok(None)` when nothing is stored, [`Error::NoUpcomingEvent`] when
    /// every stored event has already started.
    pub fn get_next_event(&self) -> HatResult<Option<&Event>> {
        self.get_next_event_at(Utc::now())
    }

    pub fn get_next_event_at(&self, now: DateTime<Utc>) -> HatResult<Option<&Event>> {
        if self.events.is_empty() {
            return Ok(None);
        }

        // min_by_key keeps the first of equal starts
        self.events
            .iter()
            .filter(|event| event.start_at() > now)
            .min_by_key(|event| event.start_at())
            .map(Some)
            .ok_or(Error::NoUpcomingEvent)
    }
}
