pub mod macros;
pub mod models;
pub mod schema;
pub mod utils;

pub use models::{
    CustomerProfile, InferenceRequest, InferenceResult, PredictionResponse, RiskLevel,
};
pub use schema::{Scalar, INFERENCE_FIELDS};
