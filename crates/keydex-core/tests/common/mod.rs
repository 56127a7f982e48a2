//! In-process stand-in for the keyword service's `/api/generate` endpoint.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

/// How the fake service answers every request.
#[derive(Clone)]
pub enum Reply {
    /// 200 with `{"response": ...}`.
    Text(String),
    /// 200 with `{"error": ...}`.
    ErrorField(String),
    /// The given status with a plain body.
    Status(u16),
    /// 200 with a body that is not JSON.
    Garbage,
    /// Answers with `Text` only after the given delay.
    Slow(Duration, String),
}

pub struct FakeService {
    reply: Reply,
    requests: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
}

impl FakeService {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

async fn generate(
    State(service): State<Arc<FakeService>>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    service.requests.fetch_add(1, Ordering::SeqCst);
    service.bodies.lock().unwrap().push(body);

    match &service.reply {
        Reply::Text(text) => (StatusCode::OK, json!({ "response": text, "done": true }).to_string()),
        Reply::ErrorField(msg) => (StatusCode::OK, json!({ "error": msg }).to_string()),
        Reply::Status(code) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "upstream failure".to_string(),
        ),
        Reply::Garbage => (StatusCode::OK, "<html>not json</html>".to_string()),
        Reply::Slow(delay, text) => {
            tokio::time::sleep(*delay).await;
            (StatusCode::OK, json!({ "response": text, "done": true }).to_string())
        }
    }
}

/// Start a fake service on an ephemeral port. Returns its base URL.
pub async fn spawn(reply: Reply) -> (String, Arc<FakeService>) {
    let service = Arc::new(FakeService {
        reply,
        requests: AtomicUsize::new(0),
        bodies: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(Arc::clone(&service));

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), service)
}

/// A base URL nothing listens on.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
