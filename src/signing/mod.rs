//! Storage backend signing capability.
//!
//! [`WriteSigner`] is the seam between credential issuance and the storage
//! backend: an implementation turns (bucket, key, content type, size cap,
//! TTL) into a write URL the backend will honor. The bundled implementation
//! is [`sigv4::SigV4Signer`]; anything satisfying the trait can be injected
//! instead, including deterministic doubles.

pub mod sigv4;

use async_trait::async_trait;
use std::fmt::Write as _;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("signer configuration invalid: {0}")]
    Configuration(String),
    #[error("signing backend failed: {0}")]
    Backend(String),
}

/// Capability to mint a bounded write credential against the blob store.
///
/// The returned URL must only be honored for a `PUT` of the given key into
/// the given bucket, with the given content type, before `ttl_seconds` have
/// elapsed. `max_size_bytes` travels inside the signed material so the cap
/// cannot be stripped without invalidating the credential.
#[async_trait]
pub trait WriteSigner: Send + Sync {
    async fn sign_write(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        max_size_bytes: u64,
        ttl_seconds: u64,
    ) -> Result<Url, SignError>;
}

/// Where the blob store lives: endpoint URL, signing region, URL addressing
/// style.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: Url,
    region: String,
    path_style: bool,
}

impl Endpoint {
    /// Parse an endpoint URL. Addressing style defaults to path-style for
    /// IP and localhost endpoints, where virtual-hosted `{bucket}.{host}`
    /// names cannot resolve.
    pub fn new(endpoint: &str, region: impl Into<String>) -> Result<Self, SignError> {
        let url = Url::parse(endpoint)
            .map_err(|err| SignError::Configuration(format!("endpoint `{}`: {}", endpoint, err)))?;
        let path_style = is_path_style_default(&url);

        Ok(Self {
            url,
            region: region.into(),
            path_style,
        })
    }

    /// Override the URL addressing style.
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build the object URL for `key` in `bucket`, percent-encoding the key.
    ///
    /// Path-style puts the bucket in the path (`https://host/bucket/key`),
    /// virtual-hosted style puts it in the hostname
    /// (`https://bucket.host/key`).
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, SignError> {
        let encoded_key = percent_encode_path(key);
        let mut url = self.url.clone();

        if self.path_style {
            url.set_path(&format!("{}/{}", bucket, encoded_key));
        } else {
            let host = url
                .host_str()
                .ok_or_else(|| SignError::Configuration("endpoint has no host".into()))?;
            let bucket_host = format!("{}.{}", bucket, host);
            url.set_host(Some(&bucket_host))
                .map_err(|err| SignError::Configuration(format!("host `{}`: {}", bucket_host, err)))?;
            url.set_path(&encoded_key);
        }

        Ok(url)
    }
}

fn is_path_style_default(endpoint: &Url) -> bool {
    use url::Host;
    match endpoint.host() {
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        Some(Host::Domain(domain)) => domain == "localhost",
        None => false,
    }
}

/// Host string for the `host` header, keeping the port when non-standard.
pub(crate) fn extract_host(url: &Url) -> Result<String, SignError> {
    let hostname = url
        .host_str()
        .ok_or_else(|| SignError::Configuration("URL missing host".into()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", hostname, port),
        None => hostname.to_string(),
    })
}

/// Percent-encode everything outside the URI unreserved set.
pub(crate) fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                write!(out, "%{:02X}", byte).unwrap();
            }
        }
    }
    out
}

/// Percent-encode a path, segment by segment, preserving slashes.
pub(crate) fn percent_encode_path(path: &str) -> String {
    path.split('/')
        .map(percent_encode)
        .collect::<Vec<_>>()
        .join("/")
}
