use actix_web::{http::header, middleware::DefaultHeaders};

/// Request headers browsers may send through the relay.
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type, \
x-supabase-client-platform, x-supabase-client-platform-version, \
x-supabase-client-runtime, x-supabase-client-runtime-version";

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

// The caller runs in a browser and the model service sends no CORS headers
// itself, so every response gets them, errors and 404s included.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
}
