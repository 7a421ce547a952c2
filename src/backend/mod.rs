//! Client side of the document-QA backend contract.
//!
//! The backend owns ingestion, retrieval, generation and history; this crate
//! only reaches it through three calls:
//!
//! | Call | Method & path |
//! |------|---------------|
//! | [`Backend::ingest`] | `POST {base}/ingest` (multipart, field `files`) |
//! | [`Backend::ask`] | `POST {base}/ask` (JSON) |
//! | [`Backend::history`] | `GET {base}/session/{id}/history` |
//!
//! [`HttpBackend`] is the real implementation. Sessions hold an
//! `Arc<dyn Backend>` so tests can substitute a scripted one.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::HttpBackend;
pub use error::{BackendError, Result};
pub use types::{
    AskRequest, AskResponse, HistoryEntry, HistoryResponse, IngestResponse, PendingUpload,
};

/// The three backend operations a chat session depends on.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Upload documents for indexing.
    async fn ingest(&self, files: &[PendingUpload]) -> Result<IngestResponse>;

    /// Ask a question within a session.
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse>;

    /// Previous turns for a session, oldest first.
    async fn history(&self, session_id: &str) -> Result<Vec<HistoryEntry>>;
}
