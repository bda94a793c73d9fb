use miette::Diagnostic;
use thiserror::Error;

use crate::components::display::MatrixError;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Calendar API credentials not found: {0}")]
    #[diagnostic(
        code(calendar_hat::credentials_not_found),
        help("provision a token file out of band and point GOOGLE_TOKEN_PATH at it")
    )]
    CredentialsNotFound(String),

    #[error("Credential error: {0}")]
    #[diagnostic(code(calendar_hat::credential))]
    Credential(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calendar_hat::transport))]
    Transport(String),

    #[error("Calendar session is not connected")]
    #[diagnostic(code(calendar_hat::not_connected), help("call connect() before fetching"))]
    NotConnected,

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(calendar_hat::invalid_argument))]
    InvalidArgument(String),

    #[error("Failed to parse event: {0}")]
    #[diagnostic(code(calendar_hat::event_parse))]
    EventParse(String),

    #[error("None of the stored events starts in the future")]
    #[diagnostic(code(calendar_hat::no_upcoming_event), help("fetch again to get a fresh batch"))]
    NoUpcomingEvent,

    #[error(transparent)]
    #[diagnostic(code(calendar_hat::display))]
    Display(#[from] MatrixError),

    #[error("Not implemented: {0}")]
    #[diagnostic(code(calendar_hat::not_implemented))]
    NotImplemented(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_hat::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_hat::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_hat::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_hat::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_hat::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type HatResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create credential errors
pub fn credential_error(message: &str) -> Error {
    Error::Credential(message.to_string())
}

/// Helper to create Google Calendar transport errors
pub fn transport_error(message: &str) -> Error {
    Error::Transport(message.to_string())
}

/// Helper to create event parsing errors
pub fn event_parse_error(message: &str) -> Error {
    Error::EventParse(message.to_string())
}
