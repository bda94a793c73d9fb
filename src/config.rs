use crate::error::{config_error, env_error, HatResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Calendar queried when none is configured
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Credential file read when none is configured
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Google Calendar v3 REST root
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Optional display settings file
pub const DISPLAY_CONFIG_PATH: &str = "config/display.toml";

/// Display settings, overridable from `config/display.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Matrix width in pixels
    pub width: usize,
    /// Matrix height in pixels
    pub height: usize,
    /// Global brightness in [0, 1]
    pub brightness: f32,
    /// Text kept by the display for rendering
    pub text: String,
    /// Font file used for text rendering
    pub font: Option<PathBuf>,
    /// Seconds a rendered message stays up
    pub time_to_live: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 17,
            height: 7,
            brightness: 0.1,
            text: "default".to_string(),
            font: None,
            time_to_live: 20,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar ID to query
    pub google_calendar_id: String,
    /// Path of the persisted credential
    pub token_path: PathBuf,
    /// Calendar API base URL
    pub api_base: String,
    /// Maximum number of events requested per fetch
    pub fetch_count: u32,
    /// Seconds between two calendar polls in the application loop
    pub poll_interval_secs: u64,
    /// Display settings
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            api_base: DEFAULT_API_BASE.to_string(),
            fetch_count: 1,
            poll_interval_secs: 300,
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> HatResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(calendar_id) = env::var("GOOGLE_CALENDAR_ID") {
            config.google_calendar_id = calendar_id;
        }
        if let Ok(token_path) = env::var("GOOGLE_TOKEN_PATH") {
            config.token_path = PathBuf::from(token_path);
        }
        if let Ok(api_base) = env::var("GOOGLE_CALENDAR_API_BASE") {
            config.api_base = api_base.trim_end_matches('/').to_string();
        }

        if let Ok(count) = env::var("EVENT_FETCH_COUNT") {
            config.fetch_count = count
                .parse::<u32>()
                .map_err(|_| env_error("EVENT_FETCH_COUNT"))?;
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECS") {
            config.poll_interval_secs = interval
                .parse::<u64>()
                .map_err(|_| env_error("POLL_INTERVAL_SECS"))?;
        }

        if let Some(display) = Self::load_display(Path::new(DISPLAY_CONFIG_PATH))? {
            config.display = display;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read display settings from a TOML file, `None` if the file is absent
    pub fn load_display(path: &Path) -> HatResult<Option<DisplayConfig>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(toml::from_str::<DisplayConfig>(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reject values the rest of the application cannot work with
    pub fn validate(&self) -> HatResult<()> {
        if self.google_calendar_id.is_empty() {
            return Err(config_error("calendar id must not be empty"));
        }
        if self.fetch_count == 0 {
            return Err(config_error("EVENT_FETCH_COUNT must be at least 1"));
        }
        if self.poll_interval_secs == 0 {
            return Err(config_error("POLL_INTERVAL_SECS must be at least 1"));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(config_error("display dimensions must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.display.brightness) {
            return Err(config_error("display brightness must be within [0, 1]"));
        }
        Ok(())
    }
}
