use actix_web::{http::header, HttpRequest};

use crate::error::RelayError;

/// Accepts the platform key as `apikey: <key>` or `Authorization: Bearer <key>`.
/// With no key configured every caller is let through.
pub fn authorize(req: &HttpRequest, expected: Option<&str>) -> Result<(), RelayError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let apikey = req.headers().get("apikey").and_then(|h| h.to_str().ok());
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "));

    if apikey == Some(expected) || bearer == Some(expected) {
        Ok(())
    } else {
        Err(RelayError::Unauthorized)
    }
}
