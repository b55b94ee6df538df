pub mod admin;
pub mod feeds;
pub mod keywords;
pub mod news;
pub mod projects;

use axum::http::{StatusCode, Uri};
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> &'static str {
    "newsdesk is running"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("Not Found - {}", uri.path()) })),
    )
}
