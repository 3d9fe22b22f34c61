use crate::api;
use crate::application::pipeline::DashboardPipeline;
use crate::config::Settings;
use crate::infrastructure::load_sources;
use crate::infrastructure::log_messages::application as messages;
use crate::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    pipeline: Arc<DashboardPipeline>,
}

impl Application {
    /// Load the source tables and assemble the pipeline
    #[instrument(skip(settings), fields(environment = %settings.application.environment))]
    pub fn new(settings: Settings) -> Result<Self> {
        let sources = load_sources(&settings.data, &settings.schema)?;
        let pipeline = DashboardPipeline::from_settings(Arc::new(sources), &settings);
        Ok(Self {
            settings,
            pipeline: Arc::new(pipeline),
        })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let host = &self.settings.application.host;
        let port = self.settings.application.port;
        info!(%host, port, "{}", messages::STARTING_SERVER);

        let listener = TcpListener::bind((host.as_str(), port)).await?;
        let router = api::router(Arc::clone(&self.pipeline));
        info!(address = %listener.local_addr()?, "{}", messages::STARTED_SUCCESSFULLY);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("{}", messages::SHUTTING_DOWN);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pipeline(&self) -> &Arc<DashboardPipeline> {
        &self.pipeline
    }
}

async fn shutdown_signal() {
    // Without a signal handler the server simply runs until killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
