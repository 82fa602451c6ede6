pub mod config;
pub mod error;
pub mod predict;

pub use config::{ClientConfig, MAX_ATTEMPTS};
pub use error::PredictError;
pub use predict::PredictionClient;
