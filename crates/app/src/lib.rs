//! Vedex App
//!
//! Initialization shared by every vedex front end: logging, settings and
//! the [`Dashboard`] context.

pub mod dashboard;
pub mod logging;

pub use dashboard::{Dashboard, DashboardConfig};
pub use logging::LogLevel;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::info;
use vedex_aggregator::AggregatorError;
use vedex_gateway::ReadTransport;
use vedex_orchestrator::{OrchestratorError, ReceiptWatcher, WalletSigner};
use vedex_settings::{Settings, SettingsError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("aggregation failed: {0}")]
    Aggregator(#[from] AggregatorError),
    #[error("submission failed: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

/// Initialized application context.
pub struct App<T> {
    pub service: String,
    pub settings: Settings<T>,
}

impl App<DashboardConfig> {
    /// Build the dashboard from the loaded settings.
    pub fn dashboard(
        &self,
        transport: Arc<dyn ReadTransport>,
        signer: Arc<dyn WalletSigner>,
        watcher: Arc<dyn ReceiptWatcher>,
    ) -> Dashboard {
        Dashboard::new(&self.settings.config, transport, signer, watcher)
    }
}

pub struct AppBuilder<T> {
    service: String,
    log_level: LogLevel,
    skip_logging: bool,
    skip_banner: bool,
    config_path: Option<PathBuf>,
    _config: std::marker::PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned + Default> AppBuilder<T> {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            log_level: LogLevel::Info,
            skip_logging: false,
            skip_banner: false,
            config_path: None,
            _config: std::marker::PhantomData,
        }
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.log_level = LogLevel::from_verbose(verbose);
        self
    }

    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    pub fn skip_banner(mut self) -> Self {
        self.skip_banner = true;
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<App<T>, AppError> {
        if !self.skip_logging {
            // Another subscriber may already be installed (tests, embedding).
            let _ = logging::try_init(self.log_level);
        }

        let settings = Settings::load_or_default(&self.service, self.config_path.as_deref())?;

        if !self.skip_banner {
            info!(
                service = %self.service,
                version = env!("CARGO_PKG_VERSION"),
                settings = %settings.path().display(),
                "starting"
            );
        }

        Ok(App {
            service: self.service,
            settings,
        })
    }
}
