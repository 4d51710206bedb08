//! FTL compliance engine HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Configuration from ./config/ftl
//! cargo run --bin ftl-server
//!
//! # Configuration from another directory
//! cargo run --bin ftl-server -- /etc/ftl
//! ```
//!
//! The bind address comes from `server.bind_address` in `settings.yaml`;
//! `RUST_LOG` sets the log level (default: info).

use std::env;

use tracing::info;

use ftl_engine::api::{AppState, create_router};
use ftl_engine::config::ConfigLoader;
use ftl_engine::logging;

const DEFAULT_CONFIG_DIR: &str = "./config/ftl";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config_dir = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let bind_address = config.settings().server.bind_address.clone();
    info!(
        config_dir = %config_dir,
        base_timezone = %config.settings().base_timezone,
        "Configuration loaded"
    );

    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{}", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
