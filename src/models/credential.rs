//! Represents an issued write credential.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// A bounded write capability for exactly one object.
///
/// Possession of `write_url` is the credential: it admits a single `PUT` of
/// `object_key`, capped at `max_size_bytes` and declaring `content_type`,
/// until `expires_at`. The bounds live inside the URL's signature, so a
/// holder cannot widen them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedCredential {
    /// Destination key within the configured bucket.
    pub object_key: String,

    /// Presigned URL the blob store will honor.
    pub write_url: Url,

    /// Instant the credential stops being honored.
    pub expires_at: DateTime<Utc>,

    /// Length of the validity window in seconds.
    pub ttl_seconds: u64,

    /// Upper bound on the uploaded object size in bytes.
    pub max_size_bytes: u64,

    /// Content type the upload must declare.
    pub content_type: &'static str,
}
