use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::types::PredictionResponse;
use crate::config::AppConfig;
use crate::error::{CardioError, Result};
use crate::ml::{ModelLoader, ModelState};
use crate::services::PredictionService;

#[derive(Parser)]
#[command(name = "cardiosense")]
#[command(author = "CardioSense Team")]
#[command(version = "0.1.0")]
#[command(about = "Cardiovascular disease risk prediction API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Bind address override
    #[arg(long, env = "CARDIO_HOST")]
    pub host: Option<String>,

    /// Port override
    #[arg(short, long, env = "CARDIO_PORT")]
    pub port: Option<u16>,

    /// Model artifact override (relative paths resolve against the executable's directory)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Load the model artifact and print its descriptor
    CheckModel,
    /// Run one prediction offline and print the response
    Predict {
        /// Request body, e.g. '{"age": 50, "gender": 1, ...}'
        #[arg(long)]
        json: String,
    },
}

impl Cli {
    /// Load configuration and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config)?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = &self.model {
            config.model.path = Some(model.clone());
        }
        config
            .validate()
            .map_err(|errors| CardioError::Validation(errors.join("; ")))?;
        Ok(config)
    }
}

/// Load the artifact and print its descriptor; fails if the model cannot be loaded.
pub fn check_model(config: &AppConfig) -> Result<()> {
    let loader = ModelLoader::from_config(&config.model)?;
    let model = loader.try_load()?;
    println!("{}", serde_json::to_string_pretty(model.info())?);
    Ok(())
}

/// Run the prediction pipeline once outside the server.
pub fn predict_once(config: &AppConfig, body: &str) -> Result<PredictionResponse> {
    let loader = ModelLoader::from_config(&config.model)?;
    let service = PredictionService::new(ModelState::loaded(loader.try_load()?));
    let prediction = service.predict_bytes(body.as_bytes())?;
    Ok(prediction.into())
}
