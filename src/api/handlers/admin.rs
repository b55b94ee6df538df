use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{Admin, ApiJson, ApiPath, ApiQuery, AppState};
use crate::error::Result;
use crate::models::{MarkProcessedOutcome, NewNews, NewUser, News, User};
use crate::queue::{QueueMessage, QueueName};
use crate::scheduler::TickReport;

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct EnqueuedResponse {
    pub queue: QueueName,
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    pub cron: String,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub cron: String,
    /// None when no job is registered for the cron string.
    pub report: Option<TickReport>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Admin(_): Admin,
    ApiJson(payload): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.repo.create_user(payload).await?;
    tracing::info!("Created user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_news(
    State(state): State<AppState>,
    Admin(_): Admin,
    ApiJson(payload): ApiJson<NewNews>,
) -> Result<(StatusCode, Json<News>)> {
    let news = state.repo.create_news(payload).await?;
    Ok((StatusCode::CREATED, Json(news)))
}

pub async fn news_exists(
    State(state): State<AppState>,
    Admin(_): Admin,
    ApiQuery(query): ApiQuery<UrlQuery>,
) -> Result<Json<ExistsResponse>> {
    let exists = state.repo.news_exists(&query.url).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn enqueue_news(
    State(state): State<AppState>,
    admin: Admin,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<(StatusCode, Json<EnqueuedResponse>)> {
    publish(&state, admin, QueueName::News, payload).await
}

/// Publishes a raw message to any known queue after schema validation.
pub async fn publish_to_queue(
    State(state): State<AppState>,
    admin: Admin,
    ApiPath(queue): ApiPath<String>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<(StatusCode, Json<EnqueuedResponse>)> {
    let queue: QueueName = queue.parse()?;
    publish(&state, admin, queue, payload).await
}

async fn publish(
    state: &AppState,
    Admin(user): Admin,
    queue: QueueName,
    payload: serde_json::Value,
) -> Result<(StatusCode, Json<EnqueuedResponse>)> {
    let message = QueueMessage::from_json(queue, payload)?;
    state.publisher.publish(&message).await?;

    tracing::info!("User {} enqueued a message on '{}'", user.id, queue);
    Ok((StatusCode::ACCEPTED, Json(EnqueuedResponse { queue })))
}

pub async fn mark_keyword_processed(
    State(state): State<AppState>,
    Admin(_): Admin,
    ApiPath(keyword_id): ApiPath<i64>,
) -> Result<Json<MarkProcessedOutcome>> {
    Ok(Json(state.repo.mark_processed(keyword_id).await?))
}

pub async fn run_tick(
    State(state): State<AppState>,
    Admin(user): Admin,
    ApiJson(payload): ApiJson<TickRequest>,
) -> Result<Json<TickResponse>> {
    tracing::info!("User {} triggered tick \"{}\"", user.id, payload.cron);
    let report = state.scheduler.tick(&payload.cron).await?;
    Ok(Json(TickResponse {
        cron: payload.cron,
        report,
    }))
}
