//! Ask widget server
//!
//! Serves the chat page, the widget bundle and the `/ask` endpoint.

#[cfg(not(target_arch = "wasm32"))]
use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[cfg(not(target_arch = "wasm32"))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use std::sync::Arc;

    use ask_widget::{config::AppConfig, server, telemetry};

    if let Err(e) = telemetry::try_init() {
        eprintln!("Logging setup failed: {e}");
    }

    // Load .env (if present)
    let _ = dotenvy::dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start_server(config).await {
        tracing::error!(name: "server.failed", error = ?e, "Server exited with error");
        std::process::exit(1);
    }
}

// The browser build enters through `browser::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
