use std::time::Instant;

use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse, Responder};
use common::schema;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{auth::authorize, config::Config, error::RelayError};

pub struct RelayState {
    pub config: Config,
    client: Client,
}

impl RelayState {
    pub fn new(config: Config) -> Self {
        RelayState {
            config,
            client: Client::new(),
        }
    }
}

#[actix_web::get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

// Answered here, the model service never sees a preflight.
#[actix_web::options("/predict-proxy")]
pub async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

#[actix_web::post("/predict-proxy")]
pub async fn predict_proxy(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    app_state: web::Data<RelayState>,
) -> Result<HttpResponse, RelayError> {
    authorize(&req, app_state.config.api_key.as_deref())?;
    let body = body.map_err(|err| RelayError::Payload(err.to_string()))?;

    let request_id = Uuid::new_v4();
    let span = info_span!("predict_proxy", %request_id);
    async move {
        let start = Instant::now();
        let result = forward(&app_state, &body).await;
        let latency_ms = start.elapsed().as_millis();

        match result {
            Ok(text) => {
                info!(latency_ms = %latency_ms, "Relayed prediction");
                Ok(HttpResponse::Ok()
                    .insert_header(ContentType::json())
                    .body(text))
            }
            Err(err) => {
                warn!(latency_ms = %latency_ms, error = %err, "Relay failed");
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

/// Sanitize the caller's record and hand the model service's answer back untouched.
async fn forward(state: &RelayState, body: &[u8]) -> Result<String, RelayError> {
    let mut record: Map<String, Value> = serde_json::from_slice(body)?;
    schema::sanitize(&mut record);

    let url = state.config.predict_url();
    let exchange = async {
        let response = state.client.post(&url).json(&record).send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };

    // Dropping the exchange on timeout cancels the request and frees its connection.
    let (status, text) = tokio::time::timeout(state.config.upstream_timeout, exchange)
        .await
        .map_err(|_| RelayError::Timeout(state.config.upstream_timeout))??;

    info!(status = status.as_u16(), "Upstream answered");
    if !status.is_success() {
        return Err(RelayError::Upstream {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(text)
}
