#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// How the fake xAI server answers every request.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Status(StatusCode, &'static str),
    MalformedBody,
    Delay(Duration),
}

#[derive(Clone)]
struct FakeState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct FakeXai {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeXai {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<FakeState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
        body: body.clone(),
    });

    match state.behavior {
        Behavior::Status(status, message) => return (status, message).into_response(),
        Behavior::MalformedBody => return (StatusCode::OK, "not json").into_response(),
        Behavior::Delay(delay) => tokio::time::sleep(delay).await,
        Behavior::Succeed => {}
    }

    if uri.path().ends_with("/chat/completions") {
        Json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "  A luminous cat drifting past Saturn  " }
            }]
        }))
        .into_response()
    } else if uri.path().ends_with("/images/edits") {
        Json(json!({ "data": [{ "url": "https://cdn.example.com/edited.png" }] })).into_response()
    } else {
        Json(json!({
            "data": [
                { "url": "https://cdn.example.com/1.png" },
                { "url": "https://cdn.example.com/2.png" }
            ]
        }))
        .into_response()
    }
}

pub async fn spawn_fake_xai(behavior: Behavior) -> FakeXai {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/chat/completions", post(handle))
        .route("/v1/images/generations", post(handle))
        .route("/v1/images/edits", post(handle))
        .with_state(FakeState {
            behavior,
            requests: requests.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeXai {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}
