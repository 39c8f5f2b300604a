use std::net::SocketAddr;
use std::sync::Arc;

use sigstudio::config::StudioConfig;
use sigstudio::state::AppState;
use sigstudio::{routes, storage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = StudioConfig::from_env().expect("invalid configuration");

    let store = storage::open_store(&config)
        .await
        .expect("object store init failed");
    let state = AppState::new(Arc::new(config.clone()), store);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind((config.bind_addr.as_str(), config.port))
        .await
        .expect("failed to bind");

    tracing::info!(
        port = config.port,
        backend = config.storage_backend.as_str(),
        public_base_url = %config.public_base_url,
        "sigstudio listening"
    );
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("server failed");
}
