//! Request and response shapes for the upload URL endpoint.

use crate::models::credential::IssuedCredential;
use serde::{Deserialize, Serialize};

/// Query params accepted by `GET /generate-url`.
#[derive(Debug, Deserialize)]
pub struct UploadUrlQuery {
    /// Filename the credential is requested for.
    pub filename: Option<String>,

    /// Content type the client claims. Recorded for observability, never
    /// trusted: the issued credential always carries the inferred type.
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
}

/// A filename that passed validation, paired with its inferred content type.
///
/// Produced only by `validation_service::validate_filename`. The object key
/// is the filename unchanged; the content type comes from the fixed
/// extension table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub object_key: String,
    pub content_type: &'static str,
}

/// Success body of `GET /generate-url`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrantResponse {
    pub upload_url: String,
    pub expires_in: u64,
    pub max_file_size: u64,
}

impl From<IssuedCredential> for UploadGrantResponse {
    fn from(credential: IssuedCredential) -> Self {
        Self {
            upload_url: credential.write_url.into(),
            expires_in: credential.ttl_seconds,
            max_file_size: credential.max_size_bytes,
        }
    }
}
