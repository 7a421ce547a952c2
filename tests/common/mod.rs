//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use knowledge_assistant::AppState;
use knowledge_assistant::backend::{
    self, AskRequest, AskResponse, Backend, BackendError, HistoryEntry, IngestResponse,
    PendingUpload,
};
use knowledge_assistant::config::{
    AppConfig, BackendConfig, ChatConfig, LoggingConfig, ServerConfig,
};
use knowledge_assistant::model::ModelId;
use knowledge_assistant::session::SessionStore;
use tokio::sync::Notify;

/// In-memory backend that answers from queues and records every call.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub history: Mutex<Vec<HistoryEntry>>,
    pub history_fails: bool,
    pub answers: Mutex<VecDeque<backend::Result<AskResponse>>>,
    pub ingest_results: Mutex<VecDeque<backend::Result<IngestResponse>>>,
    pub asked: Mutex<Vec<AskRequest>>,
    pub ingested: Mutex<Vec<Vec<PendingUpload>>>,
    /// When set, `ask` and `ingest` block until notified.
    pub gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn with_history(turns: &[(&str, &str)]) -> Self {
        let history = turns
            .iter()
            .map(|(q, a)| HistoryEntry {
                question: (*q).to_string(),
                answer: (*a).to_string(),
            })
            .collect();
        Self {
            history: Mutex::new(history),
            ..Self::default()
        }
    }

    pub fn answer(&self, text: &str) {
        self.answers.lock().unwrap().push_back(Ok(AskResponse {
            answer: text.to_string(),
        }));
    }

    pub fn fail_next_ask(&self, error: BackendError) {
        self.answers.lock().unwrap().push_back(Err(error));
    }

    pub fn asked(&self) -> Vec<AskRequest> {
        self.asked.lock().unwrap().clone()
    }

    pub fn ingested_names(&self) -> Vec<Vec<String>> {
        self.ingested
            .lock()
            .unwrap()
            .iter()
            .map(|batch| batch.iter().map(|f| f.file_name.clone()).collect())
            .collect()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn ingest(&self, files: &[PendingUpload]) -> backend::Result<IngestResponse> {
        self.ingested.lock().unwrap().push(files.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.ingest_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(IngestResponse {
                message: format!("Successfully ingested {} documents.", files.len()),
            })
        })
    }

    async fn ask(&self, request: &AskRequest) -> backend::Result<AskResponse> {
        self.asked.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(AskResponse {
                answer: format!("echo: {}", request.question),
            })
        })
    }

    async fn history(&self, _session_id: &str) -> backend::Result<Vec<HistoryEntry>> {
        if self.history_fails {
            return Err(BackendError::Api {
                status: 503,
                message: "history unavailable".to_string(),
            });
        }
        Ok(self.history.lock().unwrap().clone())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        },
        backend: BackendConfig {
            base_url: "http://backend.invalid/api".to_string(),
            timeout_secs: 0,
        },
        chat: ChatConfig {
            title: "Knowledge Assistant".to_string(),
            default_model: ModelId::Llama3,
            clear_uploads_after_ingest: false,
            session_idle_secs: 1800,
            suggestions: vec!["What is the refund policy?".to_string()],
        },
        logging: LoggingConfig { json: false },
    }
}

pub fn test_state(backend: Arc<FakeBackend>) -> AppState {
    AppState {
        sessions: SessionStore::new(),
        backend,
        config: Arc::new(test_config()),
    }
}
