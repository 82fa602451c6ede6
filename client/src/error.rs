#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// The relay answered with a non-success status other than a cold-start timeout.
    #[error("Prediction API Error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model service still unavailable after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("could not reach the prediction relay: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected prediction response: {0}")]
    Decode(#[source] serde_json::Error),
}
