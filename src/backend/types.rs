//! Wire types for the document-QA backend.
//!
//! These mirror the backend's JSON bodies exactly; field names are part of
//! the contract.

use serde::{Deserialize, Serialize};

use crate::model::ModelId;

// =============================================================================
// Ingest
// =============================================================================

/// A file the user picked for ingestion but has not submitted yet.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingUpload {
    /// Original file name as reported by the browser.
    pub file_name: String,
    /// MIME type, `application/pdf` for the files the picker offers.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl PendingUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Keep file contents out of logs.
impl std::fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Response from `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestResponse {
    /// Confirmation shown to the user.
    pub message: String,
}

// =============================================================================
// Ask
// =============================================================================

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskRequest {
    pub session_id: String,
    pub question: String,
    pub model: ModelId,
}

/// Response from `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub answer: String,
}

// =============================================================================
// History
// =============================================================================

/// One completed question/answer turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

/// Response from `GET /session/{id}/history`, oldest turn first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}
