use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::AppState;
use crate::backend::{Backend, HttpBackend, PendingUpload};
use crate::config::AppConfig;
use crate::model::ModelId;
use crate::session::{ChatMessage, ChatSession, IngestOutcome, SessionError, SessionStore};
use crate::ui::chat::{ChatPage, render_chat_page, render_transcript, render_uploads};

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Response header carrying the id of the session a page load created.
pub const SESSION_HEADER: &str = "x-session-id";

type ApiError = (StatusCode, String);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let http = if config.backend.timeout_secs == 0 {
        HttpBackend::new(&config.backend.base_url)?
    } else {
        HttpBackend::with_timeout(
            &config.backend.base_url,
            Duration::from_secs(config.backend.timeout_secs),
        )?
    };

    info!(
        name: "backend.config.loaded",
        base_url = %http.base_url(),
        timeout_secs = config.backend.timeout_secs,
        default_model = %config.chat.default_model,
        "Backend configuration loaded"
    );
    let backend: Arc<dyn Backend> = Arc::new(http);

    let sessions = SessionStore::new();
    spawn_session_sweeper(
        sessions.clone(),
        Duration::from_secs(config.chat.session_idle_secs),
    );

    let state = AppState {
        sessions,
        backend,
        config: Arc::clone(&config),
    };
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the router; split out so tests can drive it without a socket.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/models", get(api_get_models))
        .route("/chat/{id}/transcript", get(transcript_handler))
        .route("/chat/{id}/messages", get(api_get_messages))
        .route("/chat/{id}/ask", post(ask_handler))
        .route("/chat/{id}/model", post(model_handler))
        .route("/chat/{id}/files", post(files_handler))
        .route("/chat/{id}/ingest", post(ingest_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drop sessions nobody has touched for `idle`.
fn spawn_session_sweeper(sessions: SessionStore, idle: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(idle);
            if removed > 0 {
                info!(
                    name: "session.swept",
                    removed,
                    remaining = sessions.len(),
                    "Removed idle sessions"
                );
            }
        }
    });
}

fn lookup(state: &AppState, id: &str) -> Result<ChatSession, ApiError> {
    state.sessions.get(id).ok_or_else(|| {
        debug!(session_id = %id, "Unknown session");
        (StatusCode::NOT_FOUND, format!("Unknown session: {id}"))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// 409 while the same kind of call is still running.
fn session_error(e: SessionError) -> ApiError {
    let status = if e.is_in_flight() {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, e.to_string())
}

/// GET / - New client instance, history replayed, page rendered.
async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session =
        ChatSession::initialize(Arc::clone(&state.backend), state.config.chat.session_options())
            .await;
    state.sessions.insert(session.clone());

    info!(
        name: "session.created",
        session_id = %session.id(),
        replayed = session.message_count(),
        "Chat session created"
    );

    let html = render_chat_page(&ChatPage {
        title: &state.config.chat.title,
        session: &session,
        suggestions: &state.config.chat.suggestions,
    });
    ([(SESSION_HEADER, session.id().to_string())], Html(html))
}

/// GET /health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /chat/:id/transcript - Transcript fragment.
async fn transcript_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let session = lookup(&state, &id)?;
    Ok(Html(render_transcript(
        &session.messages(),
        session.is_asking(),
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body for asking. `prefilled` wins over `question` when both are sent.
#[derive(Debug, Deserialize)]
struct AskForm {
    /// Contents of the question box.
    #[serde(default)]
    question: Option<String>,
    /// Question supplied directly, e.g. by a suggestion.
    #[serde(default)]
    prefilled: Option<String>,
}

/// POST /chat/:id/ask - Ask, then return the updated transcript.
async fn ask_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AskForm>,
) -> Result<Html<String>, ApiError> {
    let session = lookup(&state, &id)?;

    let result = match form.prefilled.as_deref() {
        Some(prefilled) => session.submit_question(Some(prefilled)).await,
        None => session.submit_input(form.question.unwrap_or_default()).await,
    };
    result.map_err(session_error)?;

    Ok(Html(render_transcript(
        &session.messages(),
        session.is_asking(),
    )))
}

#[derive(Debug, Deserialize)]
struct ModelForm {
    model: String,
}

/// POST /chat/:id/model - Change the model for later questions.
async fn model_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ModelForm>,
) -> Result<StatusCode, ApiError> {
    let session = lookup(&state, &id)?;
    let model: ModelId = form
        .model
        .parse()
        .map_err(|e: crate::model::UnknownModel| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    session.select_model(model);
    debug!(session_id = %id, model = %model, "Model selected");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /chat/:id/files - Replace the file selection.
///
/// The picker only offers PDFs; other types are accepted and left for the
/// backend to judge.
async fn files_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let session = lookup(&state, &id)?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart field: {e}"),
        )
    })? {
        if field.name() != Some("files") {
            continue;
        }
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string)
        else {
            continue;
        };
        let content_type = field
            .content_type()
            .map_or_else(|| "application/pdf".to_string(), str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file '{file_name}': {e}"),
            )
        })?;
        files.push(PendingUpload::new(file_name, content_type, bytes.to_vec()));
    }

    info!(
        name: "session.files.selected",
        session_id = %id,
        files = files.len(),
        "File selection updated"
    );
    session.select_files(files);
    Ok(Html(render_uploads(&session.pending_uploads())))
}

/// Response from the ingest endpoint.
#[derive(Debug, Serialize)]
struct IngestReply {
    /// `nothing_selected`, `indexed` or `failed`.
    outcome: &'static str,
    /// Text for the blocking alert, absent when nothing was sent.
    notice: Option<String>,
}

/// POST /chat/:id/ingest - Submit the selected files.
async fn ingest_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IngestReply>, ApiError> {
    let session = lookup(&state, &id)?;
    let outcome = session
        .submit_documents()
        .await
        .map_err(session_error)?;

    let label = match &outcome {
        IngestOutcome::NothingSelected => "nothing_selected",
        IngestOutcome::Indexed { .. } => "indexed",
        IngestOutcome::Failed { .. } => "failed",
    };
    Ok(Json(IngestReply {
        outcome: label,
        notice: outcome.notice(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Model DTO for API responses.
#[derive(Debug, Serialize)]
struct ModelDto {
    id: &'static str,
    label: &'static str,
}

/// GET /api/models - Selectable models, default first.
async fn api_get_models() -> Json<Vec<ModelDto>> {
    Json(
        ModelId::ALL
            .into_iter()
            .map(|m| ModelDto {
                id: m.as_str(),
                label: m.label(),
            })
            .collect(),
    )
}

/// GET /chat/:id/messages - Transcript as JSON.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    Ok(Json(lookup(&state, &id)?.messages()))
}
