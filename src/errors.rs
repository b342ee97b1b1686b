use crate::services::{issuer_service::IssueError, validation_service::ValidationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for boundary errors that keeps the message local.
///
/// The message is the machine-readable reason string clients see; anything
/// less stable than that (backend detail, bucket names, signer output) is
/// logged where it happens and never reaches this type.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 429 Too Many Requests.
    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Client input errors: the caller can fix the filename and resubmit.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let reason = match err {
            ValidationError::EmptyFilename => "empty_filename",
            ValidationError::FilenameTooLong => "filename_too_long",
            ValidationError::InvalidFormat => "invalid_format",
        };
        AppError::new(StatusCode::BAD_REQUEST, reason)
    }
}

/// Backend errors: not the client's fault, not worth blind resubmission.
impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::SigningFailure => AppError::new(StatusCode::BAD_GATEWAY, "signing_failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn validation_reasons_map_to_bad_request() {
        let cases = [
            (ValidationError::EmptyFilename, "empty_filename"),
            (ValidationError::FilenameTooLong, "filename_too_long"),
            (ValidationError::InvalidFormat, "invalid_format"),
        ];
        for (err, reason) in cases {
            let app_err = AppError::from(err);
            assert_eq!(app_err.status, StatusCode::BAD_REQUEST);
            assert_eq!(app_err.message, reason);
        }
    }

    #[test]
    fn signing_failure_maps_to_bad_gateway() {
        let app_err = AppError::from(IssueError::SigningFailure);
        assert_eq!(app_err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(app_err.message, "signing_failure");
    }

    #[test]
    fn throttle_shortcut_uses_its_reason_code() {
        let app_err = AppError::too_many_requests();
        assert_eq!(app_err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(app_err.message, "rate_limit_exceeded");
    }

    #[tokio::test]
    async fn response_body_carries_reason_and_status() {
        let response = AppError::from(ValidationError::InvalidFormat).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_format");
        assert_eq!(body["status"], 400);
    }
}
