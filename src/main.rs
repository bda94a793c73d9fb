mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar-hat");

    // Load configuration
    let config = startup::load_config()?;

    // Poll the calendar until asked to stop
    startup::run(config).await
}
