//! Knowledge Assistant chat frontend
//!
//! A single-page chat interface for a document question-answering backend.
//! Users upload PDFs, pick a model, and trade questions and answers; prior
//! turns of a session are replayed when the page loads.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server rendering the page and its fragments
//! - **Sessions**: one [`session::ChatSession`] per page load, holding the transcript
//! - **Backend**: thin reqwest client for the external `ingest` / `ask` / `history` API
//! - **UI**: server-rendered HTML plus a small inline script
//!
//! # Modules
//!
//! - [`backend`]: Backend contract and HTTP client
//! - [`config`]: CLI and layered configuration
//! - [`model`]: Selectable language models
//! - [`server`]: Router, handlers and startup
//! - [`session`]: Chat session state and storage
//! - [`ui`]: HTML rendering

pub mod backend;
pub mod config;
pub mod model;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use backend::Backend;
use config::AppConfig;
use session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live chat sessions, one per page load.
    pub sessions: SessionStore,
    /// Backend every session talks to.
    pub backend: Arc<dyn Backend>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
