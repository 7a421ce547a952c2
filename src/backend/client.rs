//! reqwest implementation of [`Backend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use url::Url;

use super::Backend;
use super::error::{BackendError, Result};
use super::types::{
    AskRequest, AskResponse, HistoryEntry, HistoryResponse, IngestResponse, PendingUpload,
};

/// Multipart field every uploaded file is sent under.
const FILES_FIELD: &str = "files";

/// HTTP client for the document-QA backend.
///
/// # Example
///
/// ```rust,no_run
/// use knowledge_assistant::backend::{Backend, HttpBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpBackend::new("http://localhost:8000/api")?;
/// let history = backend.history("3f2b...").await?;
/// println!("{} previous turns", history.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a client with no request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root including any prefix (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client whose requests fail with [`BackendError::Timeout`]
    /// after `timeout`.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::UnusableBaseUrl(base_url.to_string()));
        }
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(BackendError::from_reqwest);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".into());
        Err(BackendError::Api {
            status: status.as_u16(),
            message: error_detail(&body),
        })
    }
}

/// Pull a readable message out of an error body.
///
/// FastAPI-style backends wrap errors as `{"detail": ...}`; anything else is
/// returned as-is.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn ingest(&self, files: &[PendingUpload]) -> Result<IngestResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(FILES_FIELD, part);
        }

        let response = self
            .http
            .post(self.endpoint(&["ingest"]))
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        Self::handle_response(response).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        let response = self
            .http
            .post(self.endpoint(&["ask"]))
            .json(request)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        Self::handle_response(response).await
    }

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryEntry>> {
        let response = self
            .http
            .get(self.endpoint(&["session", session_id, "history"]))
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        let body: HistoryResponse = Self::handle_response(response).await?;
        Ok(body.history)
    }
}
