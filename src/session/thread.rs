//! Chat session state and session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::busy::{BusyFlag, BusyGuard};
use super::message::ChatMessage;
use crate::backend::{AskRequest, Backend, PendingUpload};
use crate::model::ModelId;

/// Default session idle timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Per-instance settings taken from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Model selected when the session starts.
    pub model: ModelId,
    /// Drop the file selection once the backend has accepted it.
    pub clear_uploads_after_ingest: bool,
}

/// Errors from session operations. The in-flight rejections leave session
/// state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Documents are already being indexed")]
    IngestInFlight,
    #[error("A question is already being answered")]
    AskInFlight,
    /// The task running the backend call panicked or was cancelled.
    #[error("Backend task stopped: {0}")]
    TaskStopped(String),
}

impl SessionError {
    /// Another call of the same kind is still running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SessionError::IngestInFlight | SessionError::AskInFlight)
    }
}

async fn join<T>(task: JoinHandle<T>) -> Result<T, SessionError> {
    task.await
        .map_err(|e| SessionError::TaskStopped(e.to_string()))
}

/// Result of [`ChatSession::submit_documents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// No files were selected; nothing was sent.
    NothingSelected,
    /// Backend accepted the files.
    Indexed { message: String },
    /// Backend call failed.
    Failed { error: String },
}

impl IngestOutcome {
    /// Text for the blocking notification, if the call got as far as the
    /// backend.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            IngestOutcome::NothingSelected => None,
            IngestOutcome::Indexed { message } => Some(message.clone()),
            IngestOutcome::Failed { error } => Some(format!("Index error: {error}")),
        }
    }
}

/// Result of [`ChatSession::submit_question`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Question was blank; transcript unchanged, no call made.
    Empty,
    /// The assistant entry holding the answer.
    Answered(ChatMessage),
    /// The assistant entry holding the error.
    Failed(ChatMessage),
}

#[derive(Debug, Default)]
struct Uploads {
    files: Vec<PendingUpload>,
    /// Bumped on every selection so a finished ingest can tell whether the
    /// selection it sent is still the current one.
    generation: u64,
    /// Current selection was already accepted by the backend.
    ingested: bool,
}

/// A single client instance.
///
/// Cloning is cheap and yields a handle to the same instance.
#[derive(Debug, Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier, fixed for the instance's lifetime.
    id: String,
    backend: Arc<dyn Backend>,
    clear_uploads_after_ingest: bool,
    model: RwLock<ModelId>,
    uploads: RwLock<Uploads>,
    /// Transcript, append-only.
    messages: RwLock<Vec<ChatMessage>>,
    /// Contents of the question box.
    input: RwLock<String>,
    indexing: BusyFlag,
    asking: BusyFlag,
    /// Set when history could not be loaded.
    history_notice: RwLock<Option<String>>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl ChatSession {
    /// Start a new client instance and replay its history.
    ///
    /// A fresh id is generated here and nowhere else. If history cannot be
    /// fetched the transcript starts empty and [`Self::history_notice`]
    /// explains why.
    pub async fn initialize(backend: Arc<dyn Backend>, options: SessionOptions) -> Self {
        let session = Self::new(Uuid::new_v4().to_string(), backend, options);
        session.load_history().await;
        session
    }

    fn new(id: String, backend: Arc<dyn Backend>, options: SessionOptions) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                backend,
                clear_uploads_after_ingest: options.clear_uploads_after_ingest,
                model: RwLock::new(options.model),
                uploads: RwLock::new(Uploads::default()),
                messages: RwLock::new(Vec::new()),
                input: RwLock::new(String::new()),
                indexing: BusyFlag::default(),
                asking: BusyFlag::default(),
                history_notice: RwLock::new(None),
                last_activity: RwLock::new(Utc::now()),
            }),
        }
    }

    async fn load_history(&self) {
        match self.inner.backend.history(&self.inner.id).await {
            Ok(entries) => {
                info!(
                    name: "session.history.loaded",
                    session_id = %self.inner.id,
                    turns = entries.len(),
                    "Session history loaded"
                );
                let replay = entries.into_iter().flat_map(|turn| {
                    [
                        ChatMessage::user(turn.question),
                        ChatMessage::assistant(turn.answer),
                    ]
                });
                write(&self.inner.messages).extend(replay);
            }
            Err(e) => {
                warn!(
                    name: "session.history.failed",
                    session_id = %self.inner.id,
                    error = %e,
                    "Could not load session history; starting empty"
                );
                *write(&self.inner.history_notice) =
                    Some(format!("Could not load previous conversation: {e}"));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn model(&self) -> ModelId {
        *read(&self.inner.model)
    }

    /// Snapshot of the transcript.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        read(&self.inner.messages).clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        read(&self.inner.messages).len()
    }

    #[must_use]
    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        read(&self.inner.uploads).files.clone()
    }

    #[must_use]
    pub fn input(&self) -> String {
        read(&self.inner.input).clone()
    }

    #[must_use]
    pub fn is_indexing(&self) -> bool {
        self.inner.indexing.is_set()
    }

    #[must_use]
    pub fn is_asking(&self) -> bool {
        self.inner.asking.is_set()
    }

    /// Why history failed to load, if it did.
    #[must_use]
    pub fn history_notice(&self) -> Option<String> {
        read(&self.inner.history_notice).clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn select_model(&self, model: ModelId) {
        *write(&self.inner.model) = model;
        self.touch();
    }

    /// Replace the file selection.
    pub fn select_files(&self, files: Vec<PendingUpload>) {
        let mut uploads = write(&self.inner.uploads);
        uploads.files = files;
        uploads.generation += 1;
        uploads.ingested = false;
        drop(uploads);
        self.touch();
    }

    pub fn set_input(&self, text: impl Into<String>) {
        *write(&self.inner.input) = text.into();
        self.touch();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backend operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Send the selected files to the backend for indexing.
    ///
    /// `is_indexing` is set for the duration of the call and cleared on every
    /// exit path. A call made while another is in flight is rejected. The
    /// backend call runs on its own task, so the selection is settled even if
    /// the caller goes away before it finishes.
    pub async fn submit_documents(&self) -> Result<IngestOutcome, SessionError> {
        let (files, generation, ingested) = {
            let uploads = read(&self.inner.uploads);
            (uploads.files.clone(), uploads.generation, uploads.ingested)
        };
        if files.is_empty() {
            return Ok(IngestOutcome::NothingSelected);
        }

        let indexing = self
            .inner
            .indexing
            .try_begin()
            .ok_or(SessionError::IngestInFlight)?;
        self.touch();

        if ingested {
            warn!(
                name: "session.ingest.resubmitted",
                session_id = %self.inner.id,
                files = files.len(),
                "Re-sending a selection the backend already accepted"
            );
        }
        info!(
            name: "session.ingest.started",
            session_id = %self.inner.id,
            files = files.len(),
            bytes = files.iter().map(PendingUpload::size).sum::<usize>(),
            "Submitting documents"
        );

        let session = self.clone();
        let task = tokio::spawn(async move {
            let _indexing = indexing;
            let outcome = match session.inner.backend.ingest(&files).await {
                Ok(resp) => {
                    session.settle_uploads(generation);
                    info!(
                        name: "session.ingest.completed",
                        session_id = %session.inner.id,
                        message = %resp.message,
                        "Documents indexed"
                    );
                    IngestOutcome::Indexed {
                        message: resp.message,
                    }
                }
                Err(e) => {
                    warn!(
                        name: "session.ingest.failed",
                        session_id = %session.inner.id,
                        error = %e,
                        "Document ingestion failed"
                    );
                    IngestOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            session.touch();
            outcome
        });
        join(task).await
    }

    /// After a successful ingest, clear or mark the selection that was sent.
    /// A selection made while the call was running is left alone.
    fn settle_uploads(&self, sent_generation: u64) {
        let mut uploads = write(&self.inner.uploads);
        if uploads.generation != sent_generation {
            return;
        }
        if self.inner.clear_uploads_after_ingest {
            uploads.files.clear();
            uploads.generation += 1;
        } else {
            uploads.ingested = true;
        }
    }

    /// Ask a question and append the exchange to the transcript.
    ///
    /// The question is `explicit` if given, otherwise the input box; either
    /// way it is trimmed, and a blank question does nothing. The user entry
    /// is appended before the call and exactly one assistant entry after it,
    /// holding the answer or `"Error: ..."`. The assistant entry is appended
    /// even if the caller stops waiting.
    pub async fn submit_question(&self, explicit: Option<&str>) -> Result<AskOutcome, SessionError> {
        let asking = self
            .inner
            .asking
            .try_begin()
            .ok_or(SessionError::AskInFlight)?;
        let question = match explicit {
            Some(text) => text.trim().to_string(),
            None => read(&self.inner.input).trim().to_string(),
        };
        self.ask_claimed(asking, question).await
    }

    /// Put `text` in the input box and ask it.
    ///
    /// The input box is only written once the session is free to ask, so a
    /// rejected call leaves it untouched.
    pub async fn submit_input(&self, text: impl Into<String>) -> Result<AskOutcome, SessionError> {
        let asking = self
            .inner
            .asking
            .try_begin()
            .ok_or(SessionError::AskInFlight)?;
        let question = {
            let mut input = write(&self.inner.input);
            *input = text.into();
            input.trim().to_string()
        };
        self.ask_claimed(asking, question).await
    }

    async fn ask_claimed(&self, asking: BusyGuard, question: String) -> Result<AskOutcome, SessionError> {
        if question.is_empty() {
            return Ok(AskOutcome::Empty);
        }

        self.push(ChatMessage::user(question.clone()));
        write(&self.inner.input).clear();

        let request = AskRequest {
            session_id: self.inner.id.clone(),
            question,
            model: self.model(),
        };
        info!(
            name: "session.ask.started",
            session_id = %request.session_id,
            model = %request.model,
            "Asking question"
        );

        let session = self.clone();
        let task = tokio::spawn(async move {
            let _asking = asking;
            let reply = match session.inner.backend.ask(&request).await {
                Ok(resp) => {
                    info!(
                        name: "session.ask.answered",
                        session_id = %request.session_id,
                        answer_length = resp.answer.len(),
                        "Question answered"
                    );
                    AskOutcome::Answered(ChatMessage::assistant(resp.answer))
                }
                Err(e) => {
                    warn!(
                        name: "session.ask.failed",
                        session_id = %request.session_id,
                        error = %e,
                        "Question failed"
                    );
                    AskOutcome::Failed(ChatMessage::assistant_error(&e))
                }
            };
            if let AskOutcome::Answered(message) | AskOutcome::Failed(message) = &reply {
                session.push(message.clone());
            }
            reply
        });
        join(task).await
    }

    fn push(&self, message: ChatMessage) {
        write(&self.inner.messages).push(message);
        self.touch();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expiry
    // ─────────────────────────────────────────────────────────────────────────

    /// Update the last activity timestamp.
    fn touch(&self) {
        *write(&self.inner.last_activity) = Utc::now();
    }

    /// Idle longer than `timeout` with nothing in flight.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        if self.is_asking() || self.is_indexing() {
            return false;
        }
        let last = *read(&self.inner.last_activity);
        // Negative means clock skew; treat as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store for live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its own id.
    pub fn insert(&self, session: ChatSession) {
        write(&self.inner).insert(session.id().to_string(), session);
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ChatSession> {
        read(&self.inner).get(id).cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<ChatSession> {
        write(&self.inner).remove(id)
    }

    /// Get the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been idle longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = write(&self.inner);
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }
}
