pub mod models;
mod session;
pub mod time;
pub mod token;
pub mod transport;

pub use models::{Event, EventDateTime, EventList, RawEvent, DEFAULT_EVENT_TYPE};
pub use session::{GoogleCalendar, TransportBuilder, DEFAULT_FETCH_COUNT};
pub use token::{Credential, CredentialStore, FileCredentialStore};
pub use transport::{CalendarTransport, EventQuery, HttpTransport};
