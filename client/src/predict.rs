use common::{CustomerProfile, InferenceRequest, InferenceResult, PredictionResponse};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, MAX_ATTEMPTS};
use crate::error::PredictError;

/// Outcome of one round trip that did not fail terminally.
#[derive(Debug)]
enum Attempt {
    Success(InferenceResult),
    /// The relay gave up waiting on a cold model service; worth another try.
    Retryable { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    config: ClientConfig,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self, PredictError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(PredictionClient { client, config })
    }

    pub async fn predict(&self, profile: &CustomerProfile) -> Result<InferenceResult, PredictError> {
        let payload = InferenceRequest::from_profile(profile);
        payload.log_snapshot();
        self.predict_payload(&payload).await
    }

    /// Attempts run one after another with no delay; only a relay 504 is retried.
    pub async fn predict_payload(
        &self,
        payload: &InferenceRequest,
    ) -> Result<InferenceResult, PredictError> {
        let mut last = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            info!(attempt, max_attempts = MAX_ATTEMPTS, "Sending prediction to relay");
            match self.attempt(payload).await? {
                Attempt::Success(result) => return Ok(result),
                Attempt::Retryable { status, body } => {
                    warn!(attempt, status, "Relay timed out, model service is likely cold-starting");
                    last = body;
                }
            }
        }

        Err(PredictError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            last,
        })
    }

    async fn attempt(&self, payload: &InferenceRequest) -> Result<Attempt, PredictError> {
        let mut request = self.client.post(&self.config.relay_url).json(payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("apikey", api_key).bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::GATEWAY_TIMEOUT {
            return Ok(Attempt::Retryable {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            error!(status = status.as_u16(), %body, "Prediction API error");
            return Err(PredictError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: PredictionResponse =
            serde_json::from_str(&body).map_err(PredictError::Decode)?;
        debug!(?response, "Relay response");

        Ok(Attempt::Success(InferenceResult::from_response(response)))
    }
}
