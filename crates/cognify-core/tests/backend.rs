//! Exercises `BackendClient` against a throwaway axum backend.

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cognify_core::{
    ApiError, BackendClient, ContentId, Conversation, IngestForm, IngestKind, Notice,
};
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Whatever a route saw of the request, for the test to assert on
type Seen = mpsc::UnboundedSender<Value>;

struct Backend {
    base: String,
    seen: mpsc::UnboundedReceiver<Value>,
}

async fn serve(routes: Router<Seen>) -> Backend {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = routes.with_state(tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        base: format!("http://{}", addr),
        seen: rx,
    }
}

/// Streamed body sent piece by piece with a pause between, so the client sees
/// separate network reads
fn event_stream(pieces: Vec<&'static str>) -> Response {
    let chunks = stream::iter(pieces).then(|piece| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok::<_, Infallible>(piece)
    });
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(chunks),
    )
        .into_response()
}

#[tokio::test]
async fn test_process_video_returns_content_id() {
    let mut backend = serve(Router::new().route(
        "/process-video",
        post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
            seen.send(body).ok();
            Json(json!({"content_id": "vid-42", "message": "Video processed successfully"}))
        }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    let id = client.process_video("https://youtu.be/abc").await.unwrap();
    assert_eq!(id, ContentId::new("vid-42"));

    let body = backend.seen.recv().await.unwrap();
    assert_eq!(body, json!({"url": "https://youtu.be/abc"}));
}

#[tokio::test]
async fn test_process_pdf_error_detail_reaches_form() {
    let mut backend = serve(Router::new().route(
        "/process-pdf",
        post(|State(seen): State<Seen>, mut multipart: Multipart| async move {
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap();
                seen.send(json!({
                    "name": name,
                    "file_name": file_name,
                    "content_type": content_type,
                    "body": String::from_utf8_lossy(&bytes),
                }))
                .ok();
            }
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"detail": "file too large"})),
            )
        }),
    ))
    .await;

    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4 tiny").unwrap();

    let mut form = IngestForm::new();
    form.document_path = file.path().display().to_string();
    let path = form.begin_document().unwrap();

    let client = BackendClient::new(&backend.base);
    let result = client.process_pdf(&path).await;
    assert!(matches!(result, Err(ApiError::Status { status: 413, .. })));

    assert_eq!(form.complete(IngestKind::Document, result), None);
    assert_eq!(form.notice(), Some(&Notice::Error("file too large".to_string())));

    let part = backend.seen.recv().await.unwrap();
    assert_eq!(part["name"], "file");
    assert_eq!(part["content_type"], "application/pdf");
    assert_eq!(part["body"], "%PDF-1.4 tiny");
    assert!(part["file_name"].as_str().unwrap().ends_with(".pdf"));
}

#[tokio::test]
async fn test_generate_quiz_parses_questions() {
    let mut backend = serve(Router::new().route(
        "/generate-quiz",
        post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
            seen.send(body).ok();
            Json(json!({
                "questions": [{"question": "2+2?", "options": ["3", "4", "5"], "correct_answer": 1}]
            }))
        }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    let ids = vec![ContentId::new("a"), ContentId::new("b")];
    let questions = client.generate_quiz(&ids).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].options[questions[0].correct_answer], "4");

    let body = backend.seen.recv().await.unwrap();
    assert_eq!(body, json!({"content_ids": ["a", "b"]}));
}

#[tokio::test]
async fn test_generate_flashcards_without_detail_uses_fallback() {
    let backend = serve(Router::new().route(
        "/generate-flashcards",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))) }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    let err = client
        .generate_flashcards(&[ContentId::new("a")])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, detail: None }));
    assert_eq!(
        err.user_message("Failed to generate flashcards"),
        "Failed to generate flashcards"
    );
}

#[tokio::test]
async fn test_chat_streams_fragments_split_across_reads() {
    let mut backend = serve(Router::new().route(
        "/chat",
        post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
            seen.send(body).ok();
            event_stream(vec![
                "data: {\"content\":\"Hel\"}\n\ndata: {\"con",
                "tent\":\"lo\"}\n\n",
                "data: {bad json\n\n",
                "data: [DONE]\n\n",
                "data: {\"content\":\" ignored\"}\n\n",
            ])
        }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    let mut chat = Conversation::new();
    let exchange = chat.begin("Say hello", &[ContentId::new("a")]).unwrap();

    let mut reader = client
        .chat(&exchange.request, CancellationToken::new())
        .await
        .unwrap();
    chat.stream_opened(exchange.seq);

    while let Some(fragment) = reader.next().await {
        chat.append_fragment(exchange.seq, &fragment.unwrap());
    }
    chat.finish(exchange.seq);

    assert_eq!(chat.messages().last().unwrap().content, "Hello");
    assert!(!chat.is_busy());

    let body = backend.seen.recv().await.unwrap();
    assert_eq!(
        body,
        json!({"content_ids": ["a"], "message": "Say hello", "history": []})
    );
}

#[tokio::test]
async fn test_chat_non_success_fails_before_reading() {
    let backend = serve(Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "no content"})),
            )
        }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    let mut chat = Conversation::new();
    let exchange = chat.begin("hi", &[ContentId::new("a")]).unwrap();

    let result = client.chat(&exchange.request, CancellationToken::new()).await;
    assert!(result.is_err());
    chat.fail(exchange.seq);

    assert_eq!(chat.messages().len(), 2);
    assert_eq!(chat.messages()[1].content, cognify_core::CHAT_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_backend_is_a_request_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(&format!("http://{}", addr));
    let err = client.process_video("https://youtu.be/abc").await.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
    assert_eq!(err.user_message("Failed to process video"), "Failed to process video");
}

#[tokio::test]
async fn test_ping_reads_banner() {
    let backend = serve(Router::new().route(
        "/",
        get(|| async { Json(json!({"message": "AI Learning Assistant API"})) }),
    ))
    .await;

    let client = BackendClient::new(&backend.base);
    assert_eq!(client.ping().await.unwrap(), "AI Learning Assistant API");
}
