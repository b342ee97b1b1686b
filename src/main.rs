use anyhow::Result;
use std::{io::ErrorKind, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod signing;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse + validate config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-presign with config: {:?}", cfg);
    tracing::info!(
        "Uploads into `{}` expire after {} days via bucket lifecycle",
        cfg.bucket,
        cfg.object_retention_days
    );

    // --- Initialize signer + issuer ---
    let endpoint = signing::Endpoint::new(&cfg.endpoint, cfg.region.clone())?;
    let signer = Arc::new(signing::sigv4::SigV4Signer::from_env(endpoint)?);
    let issuer = services::issuer_service::CredentialIssuer::new(
        signer,
        cfg.bucket.clone(),
        cfg.max_file_size_mb,
        cfg.url_expiration_secs,
    );

    // --- Build router ---
    let limiter = middleware::RateLimiter::new(cfg.requests_per_second, cfg.burst_capacity);
    let app = routes::routes::routes(limiter)
        .with_state(issuer)
        .layer(routes::routes::cors_layer(&cfg.allowed_origins))
        .layer(TraceLayer::new_for_http());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
