//! src/services/issuer_service.rs
//!
//! Credential Issuer: turns a validated upload into a bounded write
//! credential. The issuer owns the configured bounds (bucket, size cap,
//! TTL); the client's request contributes the object key and inferred
//! content type and nothing else. Signing is delegated to an injected
//! [`WriteSigner`] so the backend can be swapped without touching issuance
//! logic.

use crate::models::{credential::IssuedCredential, upload::ValidatedUpload};
use crate::signing::WriteSigner;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::error;

/// Ceiling on one signer call. The bundled signer computes locally and
/// never approaches this; a network-bound implementation that does is
/// reported as a signing failure rather than held open.
const SIGNER_TIMEOUT: Duration = Duration::from_secs(5);

const BYTES_PER_MIB: u64 = 1_048_576;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IssueError {
    #[error("write credential signing failed")]
    SigningFailure,
}

pub type IssueResult<T> = Result<T, IssueError>;

/// Issues upload credentials against a fixed bucket with fixed bounds.
#[derive(Clone)]
pub struct CredentialIssuer {
    signer: Arc<dyn WriteSigner>,
    bucket: String,
    max_size_bytes: u64,
    ttl_seconds: u64,
}

impl CredentialIssuer {
    /// Create an issuer for `bucket`, capping uploads at `max_file_size_mb`
    /// mebibytes and credential lifetime at `url_expiration_secs`.
    pub fn new(
        signer: Arc<dyn WriteSigner>,
        bucket: impl Into<String>,
        max_file_size_mb: u64,
        url_expiration_secs: u64,
    ) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
            max_size_bytes: max_file_size_mb * BYTES_PER_MIB,
            ttl_seconds: url_expiration_secs,
        }
    }

    /// Issue a write credential for a validated upload.
    ///
    /// Every call produces a fresh, independently valid credential; there is
    /// no deduplication of repeated requests. Signer failures and timeouts
    /// surface as [`IssueError::SigningFailure`] with the detail logged
    /// here, never carried outward.
    pub async fn issue(&self, upload: &ValidatedUpload) -> IssueResult<IssuedCredential> {
        let signed = timeout(
            SIGNER_TIMEOUT,
            self.signer.sign_write(
                &self.bucket,
                &upload.object_key,
                upload.content_type,
                self.max_size_bytes,
                self.ttl_seconds,
            ),
        )
        .await;

        let write_url = match signed {
            Ok(Ok(url)) => url,
            Ok(Err(err)) => {
                error!("write signer failed for `{}`: {}", upload.object_key, err);
                return Err(IssueError::SigningFailure);
            }
            Err(_) => {
                error!(
                    "write signer timed out after {}s for `{}`",
                    SIGNER_TIMEOUT.as_secs(),
                    upload.object_key
                );
                return Err(IssueError::SigningFailure);
            }
        };

        Ok(IssuedCredential {
            object_key: upload.object_key.clone(),
            write_url,
            expires_at: Utc::now() + chrono::Duration::seconds(self.ttl_seconds as i64),
            ttl_seconds: self.ttl_seconds,
            max_size_bytes: self.max_size_bytes,
            content_type: upload.content_type,
        })
    }
}
