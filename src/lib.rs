pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod ml;
pub mod services;

pub use config::AppConfig;
pub use error::{CardioError, Result};
pub use features::{FeatureVector, PatientRecord, FEATURE_NAMES};
pub use ml::{ClassProbabilities, Classifier, LoadedModel, ModelLoader, ModelState, RiskClass};
pub use services::{Prediction, PredictionService};
