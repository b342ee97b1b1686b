//! HTTP handler for upload credential issuance.
//! Extracts the query, validates the filename, and delegates to
//! `CredentialIssuer`; status codes come from the `AppError` mappings.

use crate::{
    errors::AppError,
    models::upload::{UploadGrantResponse, UploadUrlQuery},
    services::{issuer_service::CredentialIssuer, validation_service},
};
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::{debug, info, warn};

/// `GET /generate-url?filename=...&contentType=...`
///
/// A missing `filename` parameter is treated as an empty filename. The
/// optional `contentType` is accepted for wire compatibility but never
/// overrides inference.
pub async fn generate_upload_url(
    State(issuer): State<CredentialIssuer>,
    Query(query): Query<UploadUrlQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filename = query.filename.as_deref().unwrap_or_default();

    let upload = match validation_service::validate_filename(filename) {
        Ok(upload) => upload,
        Err(err) => {
            // Reason and length only; the raw value stays out of the logs.
            warn!(
                "rejected filename of {} chars: {}",
                filename.chars().count(),
                err
            );
            return Err(err.into());
        }
    };

    if let Some(declared) = query.content_type.as_deref() {
        if declared != upload.content_type {
            debug!(
                "client declared content type `{}`; issuing with inferred `{}`",
                declared, upload.content_type
            );
        }
    }

    let credential = issuer.issue(&upload).await?;
    info!(
        "issued upload credential for `{}`, valid until {}",
        credential.object_key, credential.expires_at
    );

    Ok(Json(UploadGrantResponse::from(credential)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{SignError, WriteSigner};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use tower::ServiceExt;
    use url::Url;

    #[derive(Default)]
    struct CountingSigner {
        calls: AtomicUsize,
        content_types: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WriteSigner for CountingSigner {
        async fn sign_write(
            &self,
            _bucket: &str,
            key: &str,
            content_type: &str,
            _max_size_bytes: u64,
            _ttl_seconds: u64,
        ) -> Result<Url, SignError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.content_types
                .lock()
                .unwrap()
                .push(content_type.to_string());
            Ok(Url::parse(&format!(
                "https://uploads.example.com/{}?X-Amz-Signature=test",
                key
            ))
            .unwrap())
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl WriteSigner for FailingSigner {
        async fn sign_write(
            &self,
            _bucket: &str,
            _key: &str,
            _content_type: &str,
            _max_size_bytes: u64,
            _ttl_seconds: u64,
        ) -> Result<Url, SignError> {
            Err(SignError::Backend("backend exploded at 3am".into()))
        }
    }

    fn test_app(signer: Arc<dyn WriteSigner>) -> Router {
        let issuer = CredentialIssuer::new(signer, "uploads", 100, 3600);
        Router::new()
            .route("/generate-url", get(generate_upload_url))
            .with_state(issuer)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn grants_a_credential_for_a_valid_filename() {
        let signer = Arc::new(CountingSigner::default());
        let (status, body) = get_json(
            test_app(signer.clone()),
            "/generate-url?filename=invoice.pdf",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expiresIn"], 3600);
        assert_eq!(body["maxFileSize"], 104_857_600);
        assert!(
            body["uploadUrl"]
                .as_str()
                .unwrap()
                .starts_with("https://uploads.example.com/invoice.pdf")
        );
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            signer.content_types.lock().unwrap().as_slice(),
            ["application/pdf"]
        );
    }

    #[tokio::test]
    async fn empty_filename_is_rejected_before_the_signer() {
        let signer = Arc::new(CountingSigner::default());
        let (status, body) =
            get_json(test_app(signer.clone()), "/generate-url?filename=").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "empty_filename");
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_filename_parameter_counts_as_empty() {
        let signer = Arc::new(CountingSigner::default());
        let (status, body) = get_json(test_app(signer.clone()), "/generate-url").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "empty_filename");
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn traversal_shaped_filenames_report_invalid_format() {
        let signer = Arc::new(CountingSigner::default());
        let (status, body) = get_json(
            test_app(signer.clone()),
            "/generate-url?filename=../../etc/passwd",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_format");
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_filenames_report_their_own_reason() {
        let name = format!("{}.pdf", "a".repeat(300));
        let (status, body) = get_json(
            test_app(Arc::new(CountingSigner::default())),
            &format!("/generate-url?filename={}", name),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "filename_too_long");
    }

    #[tokio::test]
    async fn declared_content_type_never_overrides_inference() {
        let signer = Arc::new(CountingSigner::default());
        let (status, _body) = get_json(
            test_app(signer.clone()),
            "/generate-url?filename=photo.png&contentType=application/zip",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            signer.content_types.lock().unwrap().as_slice(),
            ["image/png"]
        );
    }

    #[tokio::test]
    async fn signer_failure_yields_bad_gateway_with_no_detail() {
        let (status, body) = get_json(
            test_app(Arc::new(FailingSigner)),
            "/generate-url?filename=invoice.pdf",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "signing_failure");
        assert!(body.get("uploadUrl").is_none());
        assert!(!body.to_string().contains("exploded"));
    }

    #[tokio::test]
    async fn identical_requests_each_get_a_fresh_grant() {
        let signer = Arc::new(CountingSigner::default());

        let (first, _) = get_json(
            test_app(signer.clone()),
            "/generate-url?filename=invoice.pdf",
        )
        .await;
        let (second, _) = get_json(
            test_app(signer.clone()),
            "/generate-url?filename=invoice.pdf",
        )
        .await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    }
}
