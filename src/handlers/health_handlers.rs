//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that exercises the issuance path end to end

use crate::services::{issuer_service::CredentialIssuer, validation_service};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that validates a throwaway probe filename and issues a
/// credential for it through the real signer. The probe URL is discarded;
/// nothing is uploaded.
///
/// Returns JSON describing the check. HTTP 200 when it passes, HTTP 503
/// when it fails.
pub async fn readyz(State(issuer): State<CredentialIssuer>) -> impl IntoResponse {
    let probe_name = format!("readyz-{}.txt", Uuid::new_v4());

    let issuance_check = match validation_service::validate_filename(&probe_name) {
        Ok(probe) => match issuer.issue(&probe).await {
            Ok(_) => (true, None::<String>),
            Err(err) => (false, Some(format!("error: {}", err))),
        },
        Err(err) => (false, Some(format!("probe filename rejected: {}", err))),
    };

    let overall_ok = issuance_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "issuance",
        CheckStatus {
            ok: issuance_check.0,
            error: issuance_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
