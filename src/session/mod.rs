//! Chat sessions: one per client instance.
//!
//! A [`ChatSession`] is what a single page load talks to. It owns the session
//! identifier, the model selection, the pending uploads, the transcript and
//! the two busy flags, and it mediates every call to the backend.
//!
//! # Architecture
//!
//! - [`ChatSession`]: one client instance and its operations
//! - [`SessionStore`]: thread-safe registry of live instances
//! - [`ChatMessage`]: append-only transcript entries
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use knowledge_assistant::backend::HttpBackend;
//! use knowledge_assistant::session::{ChatSession, SessionOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new("http://localhost:8000/api")?);
//! let session = ChatSession::initialize(backend, SessionOptions::default()).await;
//!
//! session.submit_question(Some("What is the refund policy?")).await?;
//! for msg in session.messages() {
//!     println!("{}: {}", msg.sender.as_str(), msg.text);
//! }
//! # Ok(())
//! # }
//! ```

mod busy;
mod message;
mod thread;

pub use busy::{BusyFlag, BusyGuard};
pub use message::{ChatMessage, Sender};
pub use thread::{AskOutcome, ChatSession, IngestOutcome, SessionError, SessionOptions, SessionStore};
