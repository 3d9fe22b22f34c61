use anyhow::Result;
use covid_dashboard::config::Settings;
use covid_dashboard::infrastructure::{init_tracing, log_messages};
use covid_dashboard::Application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings.logging);

    info!("{}", log_messages::application::STARTING);
    info!(
        environment = %settings.application.environment,
        confirmed = %settings.data.confirmed_path.display(),
        deaths = %settings.data.deaths_path.display(),
        level = %settings.logging.level,
        "{}",
        log_messages::configuration::CONFIG_LOADED
    );

    let app = Application::new(settings)?;
    app.run().await?;

    Ok(())
}
