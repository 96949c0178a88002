//! Kehai presence-aware message router.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kehai-server -- --port 8080
//! ```

use clap::Parser;
use kehai_server::ServerConfig;
use kehai_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = kehai_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
