use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{ApiJson, ApiPath, ApiQuery, AppState, Caller};
use crate::error::{AppError, Result};
use crate::models::{
    News, NewsFilter, Page, SavedNews, SavedNewsFilter, SavedNewsItem, UpdateSavedNews,
};

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub project_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveNewsRequest {
    pub project_id: i64,
}

pub async fn list_news(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiQuery(filter): ApiQuery<NewsFilter>,
) -> Result<Json<Page<News>>> {
    state.repo.require_access(filter.project_id, user.id).await?;
    Ok(Json(state.repo.list_news(filter).await?))
}

pub async fn news_sources(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<SourcesResponse>> {
    state.repo.require_access(query.project_id, user.id).await?;
    let sources = state.repo.news_sources(query.project_id).await?;
    Ok(Json(SourcesResponse { sources }))
}

pub async fn save_news(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(news_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<SaveNewsRequest>,
) -> Result<(StatusCode, Json<SavedNews>)> {
    state.repo.require_access(payload.project_id, user.id).await?;
    let saved = state.repo.save_news(news_id, payload.project_id).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_saved_news(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiQuery(filter): ApiQuery<SavedNewsFilter>,
) -> Result<Json<Page<SavedNewsItem>>> {
    state.repo.require_access(filter.project_id, user.id).await?;
    Ok(Json(state.repo.list_saved_news(filter).await?))
}

/// Loads a saved news row and checks the caller can reach its project.
async fn saved_news_for(state: &AppState, id: i64, user_id: i64) -> Result<SavedNews> {
    let saved = state
        .repo
        .get_saved_news(id)
        .await?
        .ok_or_else(|| AppError::not_found("Saved news not found"))?;
    state.repo.require_access(saved.project_id, user_id).await?;
    Ok(saved)
}

pub async fn update_saved_news(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateSavedNews>,
) -> Result<Json<SavedNews>> {
    saved_news_for(&state, id, user.id).await?;
    Ok(Json(state.repo.update_saved_news(id, payload).await?))
}

pub async fn delete_saved_news(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    saved_news_for(&state, id, user.id).await?;
    state.repo.delete_saved_news(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
