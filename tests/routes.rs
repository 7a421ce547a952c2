//! Route-level tests for the chat frontend.
//!
//! Each test drives the real router against a [`FakeBackend`], so the
//! behavior covered here is what a browser would see.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use knowledge_assistant::backend::BackendError;
use knowledge_assistant::model::ModelId;
use knowledge_assistant::server::{SESSION_HEADER, build_router};
use knowledge_assistant::session::ChatMessage;
use tokio::sync::Notify;
use tower::ServiceExt;

use common::{FakeBackend, test_state};

fn server_for(backend: Arc<FakeBackend>) -> TestServer {
    TestServer::new(build_router(test_state(backend))).expect("test server")
}

/// Load the page and return the id of the session it created.
async fn open_page(server: &TestServer) -> String {
    let page = server.get("/").await;
    page.assert_status_ok();
    page.header(SESSION_HEADER).to_str().unwrap().to_string()
}

async fn transcript(server: &TestServer, id: &str) -> Vec<ChatMessage> {
    server
        .get(&format!("/chat/{id}/messages"))
        .await
        .json::<Vec<ChatMessage>>()
}

#[tokio::test]
async fn test_page_replays_history() {
    let backend = Arc::new(FakeBackend::with_history(&[("Q1", "A1"), ("Q2", "A2")]));
    let server = server_for(backend);

    let page = server.get("/").await;
    page.assert_status_ok();
    let html = page.text();
    let id = page.header(SESSION_HEADER).to_str().unwrap().to_string();

    assert!(html.contains(&format!(r#"data-session-id="{id}""#)));
    let q1 = html.find(r#"<div class="msg user">Q1</div>"#).unwrap();
    let a2 = html.find(r#"<div class="msg assistant">A2</div>"#).unwrap();
    assert!(q1 < a2);
    assert!(html.contains(r#"<option value="llama3" selected>"#));
    assert!(html.contains("What is the refund policy?"));
    assert!(!html.contains("history-banner"));

    assert_eq!(
        transcript(&server, &id).await,
        vec![
            ChatMessage::user("Q1"),
            ChatMessage::assistant("A1"),
            ChatMessage::user("Q2"),
            ChatMessage::assistant("A2"),
        ]
    );
}

#[tokio::test]
async fn test_each_page_load_is_a_new_session() {
    let server = server_for(Arc::new(FakeBackend::default()));

    let first = open_page(&server).await;
    let second = open_page(&server).await;

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_history_failure_shows_banner() {
    let backend = Arc::new(FakeBackend {
        history_fails: true,
        ..FakeBackend::default()
    });
    let server = server_for(backend);

    let page = server.get("/").await;
    page.assert_status_ok();
    let html = page.text();

    assert!(html.contains(r#"id="history-banner""#));
    assert!(html.contains("history unavailable"));
}

#[tokio::test]
async fn test_ask_with_selected_model() {
    let backend = Arc::new(FakeBackend::default());
    backend.answer("30 days.");
    let server = server_for(backend.clone());
    let id = open_page(&server).await;

    server
        .post(&format!("/chat/{id}/model"))
        .form(&[("model", "gemma")])
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let res = server
        .post(&format!("/chat/{id}/ask"))
        .form(&[("question", "What is the refund policy?")])
        .await;
    res.assert_status_ok();
    assert!(res.text().contains(r#"<div class="msg assistant">30 days.</div>"#));

    let asked = backend.asked();
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].session_id, id);
    assert_eq!(asked[0].question, "What is the refund policy?");
    assert_eq!(asked[0].model, ModelId::Gemma);

    assert_eq!(
        transcript(&server, &id).await.last(),
        Some(&ChatMessage::assistant("30 days."))
    );
}

#[tokio::test]
async fn test_ask_failure_appends_error() {
    let backend = Arc::new(FakeBackend::default());
    backend.fail_next_ask(BackendError::Timeout);
    let server = server_for(backend);
    let id = open_page(&server).await;

    server
        .post(&format!("/chat/{id}/ask"))
        .form(&[("prefilled", "hello")])
        .await
        .assert_status_ok();

    assert_eq!(
        transcript(&server, &id).await,
        vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("Error: timeout"),
        ]
    );
}

#[tokio::test]
async fn test_blank_question_changes_nothing() {
    let backend = Arc::new(FakeBackend::default());
    let server = server_for(backend.clone());
    let id = open_page(&server).await;

    server
        .post(&format!("/chat/{id}/ask"))
        .form(&[("question", "   ")])
        .await
        .assert_status_ok();

    assert!(transcript(&server, &id).await.is_empty());
    assert!(backend.asked().is_empty());
}

#[tokio::test]
async fn test_unknown_model_rejected() {
    let server = server_for(Arc::new(FakeBackend::default()));
    let id = open_page(&server).await;

    server
        .post(&format!("/chat/{id}/model"))
        .form(&[("model", "gpt-99")])
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let server = server_for(Arc::new(FakeBackend::default()));

    server
        .get("/chat/nope/transcript")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/chat/nope/ingest")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_then_ingest() {
    let backend = Arc::new(FakeBackend::default());
    let server = server_for(backend.clone());
    let id = open_page(&server).await;

    let nothing = server.post(&format!("/chat/{id}/ingest")).await;
    nothing.assert_status_ok();
    assert_eq!(
        nothing.json::<serde_json::Value>(),
        serde_json::json!({"outcome": "nothing_selected", "notice": null})
    );

    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"%PDF-1.4 one".to_vec())
                .file_name("terms.pdf")
                .mime_type("application/pdf"),
        )
        .add_part(
            "files",
            Part::bytes(b"%PDF-1.4 two".to_vec())
                .file_name("refunds.pdf")
                .mime_type("application/pdf"),
        );
    let uploads = server
        .post(&format!("/chat/{id}/files"))
        .multipart(form)
        .await;
    uploads.assert_status_ok();
    assert!(uploads.text().contains("terms.pdf"));

    let res = server.post(&format!("/chat/{id}/ingest")).await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<serde_json::Value>(),
        serde_json::json!({
            "outcome": "indexed",
            "notice": "Successfully ingested 2 documents."
        })
    );
    assert_eq!(
        backend.ingested_names(),
        vec![vec!["terms.pdf".to_string(), "refunds.pdf".to_string()]]
    );
    assert!(backend.ingested.lock().unwrap()[0][0].bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_ingest_failure_notice() {
    let backend = Arc::new(FakeBackend::default());
    backend
        .ingest_results
        .lock()
        .unwrap()
        .push_back(Err(BackendError::Api {
            status: 500,
            message: "bad pdf".to_string(),
        }));
    let server = server_for(backend);
    let id = open_page(&server).await;

    let form = MultipartForm::new().add_part(
        "files",
        Part::bytes(b"not really".to_vec()).file_name("broken.pdf"),
    );
    server
        .post(&format!("/chat/{id}/files"))
        .multipart(form)
        .await
        .assert_status_ok();

    let res = server.post(&format!("/chat/{id}/ingest")).await;
    assert_eq!(
        res.json::<serde_json::Value>()["notice"],
        "Index error: Request failed with status 500: bad pdf"
    );
}

#[tokio::test]
async fn test_second_ask_while_waiting_conflicts() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        gate: Some(gate.clone()),
        ..FakeBackend::default()
    });
    let state = test_state(backend);
    let app = build_router(state.clone());

    let page = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = page.headers()[SESSION_HEADER].to_str().unwrap().to_string();
    let session = state.sessions.get(&id).unwrap();

    let ask = |q: &'static str| {
        Request::post(format!("/chat/{id}/ask"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!("question={q}")))
            .unwrap()
    };

    let first = tokio::spawn(app.clone().oneshot(ask("first")));
    while !session.is_asking() {
        tokio::task::yield_now().await;
    }

    let transcript_while_waiting = app
        .clone()
        .oneshot(
            Request::get(format!("/chat/{id}/transcript"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(transcript_while_waiting.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains(r#"id="typing""#));

    let second = app.clone().oneshot(ask("second")).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(session.input(), "");

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert!(!session.is_asking());
    assert_eq!(
        session.messages(),
        vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("echo: first"),
        ]
    );
}

#[tokio::test]
async fn test_health_and_models() {
    let server = server_for(Arc::new(FakeBackend::default()));

    server.get("/health").await.assert_json(&serde_json::json!({"status": "ok"}));
    let models = server.get("/api/models").await.json::<serde_json::Value>();
    assert_eq!(models[0], serde_json::json!({"id": "llama3", "label": "llama3"}));
    assert_eq!(models[1], serde_json::json!({"id": "gemma", "label": "gemma3"}));
    assert_eq!(models.as_array().unwrap().len(), 3);
}
