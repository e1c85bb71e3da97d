//! StudioDesk sync server
//!
//! The remote document store the CLI synchronizes with. One JSON file
//! per collection, Bearer api-key auth.
//!
//! # Configuration
//!
//! Environment variables:
//! - `STUDIODESK_PORT`: Port to listen on (default: 8080)
//! - `STUDIODESK_DATA_DIR`: Directory to store collections
//!   (default: ~/.local/share/studiodesk-server)
//! - `STUDIODESK_KEYS`: Path to the API key file
//!   (default: ~/.config/studiodesk-server/keys.yaml)
//!
//! # Key File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user: "owner"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studiodesk::server::{router, ApiKeyStore, AppState, CollectionStore};

struct ServerConfig {
    port: u16,
    data_dir: PathBuf,
    keys_path: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        let port = std::env::var("STUDIODESK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("STUDIODESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("studiodesk-server")
            });

        let keys_path = std::env::var("STUDIODESK_KEYS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("studiodesk-server")
                    .join("keys.yaml")
            });

        Self {
            port,
            data_dir,
            keys_path,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studiodesk=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Key file: {}", config.keys_path.display());

    let state = AppState::new(
        ApiKeyStore::load(&config.keys_path),
        CollectionStore::new(&config.data_dir),
    );
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
