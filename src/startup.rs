use calendar_hat::components::display::{MemoryMatrix, PixelGrid};
use calendar_hat::components::{Display, GoogleCalendar};
use calendar_hat::config::Config;
use calendar_hat::error::{Error, HatResult};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::shutdown;

/// Indicator colour while an upcoming event exists
const UPCOMING_COLOUR: (u8, u8, u8) = (0, 255, 0);

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Connect to the calendar and keep the display in sync until a signal arrives
pub async fn run(config: Config) -> miette::Result<()> {
    let mut calendar = GoogleCalendar::from_config(&config);
    calendar.connect().await?;

    let (width, height) = (config.display.width, config.display.height);
    let mut display = Display::from_config(MemoryMatrix::new(width, height), &config.display)?;

    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    let signal = shutdown::wait_for_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = poll_once(&mut calendar, &mut display, config.fetch_count).await {
                    error!("Calendar poll failed: {}", e);
                }
            }
            result = &mut signal => {
                result?;
                break;
            }
        }
    }

    display.grid_mut().clear().map_err(Error::from)?;
    display.grid_mut().show().map_err(Error::from)?;
    info!("calendar-hat stopped");
    Ok(())
}

/// Fetch the calendar once and update the indicator line
async fn poll_once<G: PixelGrid>(
    calendar: &mut GoogleCalendar,
    display: &mut Display<G>,
    count: u32,
) -> HatResult<()> {
    if calendar
        .credential()
        .is_some_and(|credential| credential.is_expired(Utc::now()))
    {
        debug!("Access token expired between polls, refreshing");
        calendar.refresh_credentials().await?;
    }

    calendar.fetch(count).await?;

    display.grid_mut().clear()?;
    match calendar.get_next_event() {
        Ok(Some(event)) => {
            info!(
                "Next event: {} at {}",
                event.summary().unwrap_or("(no title)"),
                event.start_at()
            );
            let (r, g, b) = UPCOMING_COLOUR;
            display.set_column(0, r, g, b)?;
        }
        Ok(None) => info!("No upcoming events"),
        Err(Error::NoUpcomingEvent) => warn!("Fetched events have all started already"),
        Err(e) => return Err(e),
    }
    display.grid_mut().show()?;

    Ok(())
}
