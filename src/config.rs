use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Presigned URLs cannot outlive the SigV4 window of seven days.
pub const MAX_URL_EXPIRATION_SECS: u64 = 604_800;

/// A single unsigned-payload `PUT` tops out at 5 GiB.
pub const MAX_FILE_SIZE_CEILING_MB: u64 = 5120;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments, validated once at
/// startup and immutable afterwards. Backend credentials are deliberately
/// not part of this struct; the signer reads them itself so a config dump
/// can never leak them.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Bucket presigned uploads land in. Server-side knowledge only.
    pub bucket: String,
    /// Blob store endpoint URL.
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    /// Origins offered via CORS. A literal `*` opens the endpoint.
    pub allowed_origins: Vec<String>,
    /// Upload size cap in MiB.
    pub max_file_size_mb: u64,
    /// Presigned URL lifetime in seconds.
    pub url_expiration_secs: u64,
    /// Days until uploaded objects expire. Enforced by bucket lifecycle
    /// provisioning, carried here so the deployable states the contract.
    pub object_retention_days: u32,
    /// Sustained per-client request rate.
    pub requests_per_second: u32,
    /// Per-client burst allowance.
    pub burst_capacity: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Presigned upload URL issuance service")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_PRESIGN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_PRESIGN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Destination bucket (overrides UPLOAD_PRESIGN_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Blob store endpoint URL (overrides UPLOAD_PRESIGN_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Signing region (overrides UPLOAD_PRESIGN_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Comma-separated CORS allow-list (overrides UPLOAD_PRESIGN_ALLOWED_ORIGINS)
    #[arg(long)]
    pub allowed_origins: Option<String>,

    /// Upload size cap in MiB (overrides UPLOAD_PRESIGN_MAX_FILE_SIZE_MB)
    #[arg(long)]
    pub max_file_size_mb: Option<u64>,

    /// Presigned URL lifetime in seconds (overrides UPLOAD_PRESIGN_URL_EXPIRATION_SECS)
    #[arg(long)]
    pub url_expiration_secs: Option<u64>,

    /// Days until uploaded objects expire (overrides UPLOAD_PRESIGN_OBJECT_RETENTION_DAYS)
    #[arg(long)]
    pub object_retention_days: Option<u32>,

    /// Sustained per-client request rate (overrides UPLOAD_PRESIGN_REQUESTS_PER_SECOND)
    #[arg(long)]
    pub requests_per_second: Option<u32>,

    /// Per-client burst allowance (overrides UPLOAD_PRESIGN_BURST_CAPACITY)
    #[arg(long)]
    pub burst_capacity: Option<u32>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into a validated AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse())
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_PRESIGN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parsed::<u16>("UPLOAD_PRESIGN_PORT")?;
        let env_bucket = env::var("UPLOAD_PRESIGN_BUCKET").ok();
        let env_endpoint = env::var("UPLOAD_PRESIGN_ENDPOINT").ok();
        let env_region = env::var("UPLOAD_PRESIGN_REGION").ok();
        let env_origins = env::var("UPLOAD_PRESIGN_ALLOWED_ORIGINS").ok();
        let env_max_size = env_parsed::<u64>("UPLOAD_PRESIGN_MAX_FILE_SIZE_MB")?;
        let env_expiration = env_parsed::<u64>("UPLOAD_PRESIGN_URL_EXPIRATION_SECS")?;
        let env_retention = env_parsed::<u32>("UPLOAD_PRESIGN_OBJECT_RETENTION_DAYS")?;
        let env_rate = env_parsed::<u32>("UPLOAD_PRESIGN_REQUESTS_PER_SECOND")?;
        let env_burst = env_parsed::<u32>("UPLOAD_PRESIGN_BURST_CAPACITY")?;

        // --- Merge ---
        let region = args
            .region
            .or(env_region)
            .unwrap_or_else(|| "us-east-1".into());
        let endpoint = args
            .endpoint
            .or(env_endpoint)
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", region));
        let origins = args
            .allowed_origins
            .or(env_origins)
            .context("UPLOAD_PRESIGN_ALLOWED_ORIGINS (or --allowed-origins) is required")?;

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.or(env_port).unwrap_or(3000),
            bucket: args
                .bucket
                .or(env_bucket)
                .context("UPLOAD_PRESIGN_BUCKET (or --bucket) is required")?,
            endpoint,
            region,
            allowed_origins: parse_origins(&origins),
            max_file_size_mb: args.max_file_size_mb.or(env_max_size).unwrap_or(100),
            url_expiration_secs: args.url_expiration_secs.or(env_expiration).unwrap_or(3600),
            object_retention_days: args.object_retention_days.or(env_retention).context(
                "UPLOAD_PRESIGN_OBJECT_RETENTION_DAYS (or --object-retention-days) is required",
            )?,
            requests_per_second: args.requests_per_second.or(env_rate).context(
                "UPLOAD_PRESIGN_REQUESTS_PER_SECOND (or --requests-per-second) is required",
            )?,
            burst_capacity: args
                .burst_capacity
                .or(env_burst)
                .context("UPLOAD_PRESIGN_BURST_CAPACITY (or --burst-capacity) is required")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject zero, empty, or out-of-range values, naming the field.
    fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            bail!("bucket must not be empty");
        }
        if !self
            .bucket
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            bail!("bucket may use lowercase letters, digits, dots, and hyphens only");
        }
        if self.allowed_origins.is_empty() {
            bail!("allowed_origins must list at least one origin");
        }
        if self.max_file_size_mb == 0 || self.max_file_size_mb > MAX_FILE_SIZE_CEILING_MB {
            bail!(
                "max_file_size_mb must be between 1 and {}",
                MAX_FILE_SIZE_CEILING_MB
            );
        }
        if self.url_expiration_secs == 0 || self.url_expiration_secs > MAX_URL_EXPIRATION_SECS {
            bail!(
                "url_expiration_secs must be between 1 and {}",
                MAX_URL_EXPIRATION_SECS
            );
        }
        if self.object_retention_days == 0 {
            bail!("object_retention_days must be a positive integer");
        }
        if self.requests_per_second == 0 {
            bail!("requests_per_second must be a positive integer");
        }
        if self.burst_capacity == 0 {
            bail!("burst_capacity must be a positive integer");
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => bail!("parsing {} value `{}`: {}", name, value, err),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).context(format!("reading {}", name)),
    }
}
