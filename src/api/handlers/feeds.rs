use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::{ApiJson, ApiPath, AppState, Caller};
use crate::error::Result;
use crate::models::{FeedSource, NewFeedSource};

pub async fn list_feeds(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(project_id): ApiPath<i64>,
) -> Result<Json<Vec<FeedSource>>> {
    state.repo.require_access(project_id, user.id).await?;
    Ok(Json(state.repo.list_feeds(project_id).await?))
}

pub async fn add_feed(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(project_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewFeedSource>,
) -> Result<(StatusCode, Json<FeedSource>)> {
    state.repo.require_access(project_id, user.id).await?;
    let feed = state.repo.add_feed(project_id, payload).await?;
    Ok((StatusCode::CREATED, Json(feed)))
}

pub async fn delete_feed(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath((project_id, feed_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    state.repo.require_access(project_id, user.id).await?;
    state.repo.delete_feed(project_id, feed_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
