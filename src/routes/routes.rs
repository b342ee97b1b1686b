//! Defines routes for the upload credential service.
//!
//! ## Structure
//! - `GET /generate-url` -> issue a presigned upload URL (rate limited)
//! - `GET /healthz`      -> liveness
//! - `GET /readyz`       -> readiness (exercises the issuance path)
//!
//! The CORS layer is built here too; `main` applies it around the whole
//! router so preflights are answered without touching handlers.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::generate_upload_url,
    },
    middleware::{RateLimiter, throttle},
    services::issuer_service::CredentialIssuer,
};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Build and return the router for all service routes.
///
/// The router carries shared state (`CredentialIssuer`) to all handlers.
/// Only the issuance route sits behind the per-client throttle; the probe
/// endpoints stay reachable under client load.
pub fn routes(limiter: RateLimiter) -> Router<CredentialIssuer> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // issuance
        .route(
            "/generate-url",
            get(generate_upload_url).layer(from_fn_with_state(limiter, throttle)),
        )
}

/// CORS policy for browser calls to the issuance endpoint.
///
/// A literal `"*"` anywhere in the allow-list opens the endpoint to any
/// origin; otherwise exactly the listed origins are offered. Methods and
/// headers mirror what an upload page needs: `GET` plus its preflight,
/// with a `Content-Type` request header.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring unparseable allowed origin `{}`", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}
