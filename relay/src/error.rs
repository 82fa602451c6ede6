use std::time::Duration;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Upstream API error {status}")]
    Upstream { status: u16, body: String },

    #[error(
        "model service did not answer within {0:?}; it may be cold-starting, retry in a few seconds"
    )]
    Timeout(Duration),

    #[error("request body is not a JSON object: {0}")]
    Body(#[from] serde_json::Error),

    #[error("request body could not be read: {0}")]
    Payload(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("missing or invalid API key")]
    Unauthorized,
}

/// JSON body of every relay error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub detail: String,
}

impl RelayError {
    fn envelope(&self) -> ErrorEnvelope {
        match self {
            RelayError::Upstream { body, .. } => ErrorEnvelope {
                error: self.to_string(),
                detail: body.clone(),
            },
            RelayError::Unauthorized => ErrorEnvelope {
                error: "Unauthorized".to_string(),
                detail: self.to_string(),
            },
            _ => ErrorEnvelope {
                error: "Proxy error".to_string(),
                detail: self.to_string(),
            },
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::Body(_) | RelayError::Payload(_) | RelayError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_status_and_body() {
        let err = RelayError::Upstream {
            status: 422,
            body: r#"{"detail":"Invalid value '[1]' for dtype 'str'"}"#.to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let envelope = err.envelope();
        assert_eq!(envelope.error, "Upstream API error 422");
        assert_eq!(envelope.detail, r#"{"detail":"Invalid value '[1]' for dtype 'str'"}"#);
    }

    #[test]
    fn timeout_mentions_cold_start() {
        let err = RelayError::Timeout(Duration::from_secs(55));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let envelope = err.envelope();
        assert_eq!(envelope.error, "Proxy error");
        assert!(envelope.detail.contains("cold-starting"));
        assert!(envelope.detail.contains("55s"));
    }

    #[test]
    fn malformed_body_is_internal_error() {
        let err = RelayError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.envelope().error, "Proxy error");
    }
}
