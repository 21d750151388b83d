//! Ask widget
//!
//! A minimal chat widget: a form submission becomes one `POST /ask`
//! exchange, and both sides of the exchange are rendered as plain-text
//! messages in a scrolling list.
//!
//! # Architecture
//!
//! - **Widget**: DOM-agnostic submit handling and rendering ([`widget`],
//!   [`view`]), driven by a single-threaded executor
//! - **Browser**: `web-sys` bindings and the wasm entry point (`browser`,
//!   `wasm32` only)
//! - **Headless**: in-memory DOM for tests and native hosts ([`headless`])
//! - **Transport**: the `/ask` wire types and `reqwest` client ([`transport`])
//! - **Server**: Axum backend serving the page, the bundle and `/ask`,
//!   with per-visitor history ([`history`]) (native only)

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod headless;
pub mod html;
pub mod message;
pub mod transport;
pub mod view;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(not(target_arch = "wasm32"))]
pub mod answer;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod history;
#[cfg(not(target_arch = "wasm32"))]
pub mod llm;
#[cfg(not(target_arch = "wasm32"))]
pub mod page;
#[cfg(not(target_arch = "wasm32"))]
pub mod rate_limit;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;

pub use message::{Message, MessageRole};
pub use transport::{AskError, AskRequest, AskResponse, AskTransport, HttpAskClient};
pub use widget::{ChatWidget, ExchangeOutcome, FailurePolicy, Spawner};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

/// Application state shared across all handlers.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone)]
pub struct AppState {
    /// Produces answers for `/ask`.
    pub answerer: Arc<dyn answer::Answerer>,
    /// Conversation history keyed by session cookie.
    pub history: history::HistoryStore,
    /// Global Configuration
    pub config: Arc<config::AppConfig>,
}

#[cfg(not(target_arch = "wasm32"))]
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
