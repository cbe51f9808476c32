//! Stand-in for the device/cloud API, used by the client's integration tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct AppState {
    actions: AtomicU64,
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    let db: Db = Arc::new(AppState::default());
    Router::new()
        .route("/v1/device/status", get(device_status))
        .route("/v1/device/actions", post(device_action))
        .route("/v1/device/actions/count", get(action_count))
        .route("/v1/search", get(search))
        .route("/empty", get(empty))
        .route("/malformed", get(malformed))
        .route("/no-content", get(no_content))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn device_status() -> Json<Value> {
    Json(json!({
        "status": 200,
        "device": { "name": "smart-plug", "online": true }
    }))
}

async fn device_action(State(db): State<Db>, Json(input): Json<Value>) -> Json<Value> {
    db.actions.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(body = %input, "device action");
    Json(json!({ "status": 200, "echo": input }))
}

async fn action_count(State(db): State<Db>) -> Json<Value> {
    Json(json!({ "count": db.actions.load(Ordering::SeqCst) }))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({ "q": params.get("q") }))
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn malformed() -> &'static str {
    "{not json"
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
