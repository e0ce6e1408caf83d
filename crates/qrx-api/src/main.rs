//! qrx-api - HTTP API server for the qrx extraction service.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qrx_api::AppState;
use qrx_core::defaults::{ENV_SERVER_PORT, SERVER_PORT};
use qrx_core::{RegionDecoder, RegionDetector};
use qrx_extract::{ExtractorConfig, QrExtractor};
use qrx_vision::{DecoderKind, OllamaVisionDecoder, OnnxQrDetector, RqrrDecoder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Backend singletons: built once, shared read-only across requests.
    let detector: Arc<dyn RegionDetector> = Arc::new(OnnxQrDetector::from_env()?);
    let decoder: Arc<dyn RegionDecoder> = match DecoderKind::from_env() {
        DecoderKind::Classical => Arc::new(RqrrDecoder),
        DecoderKind::Vision => Arc::new(OllamaVisionDecoder::from_env()),
    };
    info!(
        detector = detector.name(),
        decoder = decoder.name(),
        "vision backends initialized"
    );

    let config = ExtractorConfig::from_env();
    let extractor = Arc::new(QrExtractor::new(detector, decoder, config));
    let state = AppState::new(extractor);

    let port = std::env::var(ENV_SERVER_PORT)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(SERVER_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "qrx-api listening");
    axum::serve(listener, qrx_api::router(state)).await?;

    Ok(())
}
