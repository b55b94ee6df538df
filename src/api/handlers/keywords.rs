use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::{ApiJson, ApiPath, AppState, Caller};
use crate::error::Result;
use crate::models::Keyword;

#[derive(Debug, Deserialize)]
pub struct AddKeywordRequest {
    pub content: String,
}

pub async fn list_keywords(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(project_id): ApiPath<i64>,
) -> Result<Json<Vec<Keyword>>> {
    state.repo.require_access(project_id, user.id).await?;
    Ok(Json(state.repo.list_keywords(project_id).await?))
}

pub async fn add_keyword(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(project_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AddKeywordRequest>,
) -> Result<(StatusCode, Json<Keyword>)> {
    state.repo.require_owner(project_id, user.id).await?;
    let keyword = state.repo.add_keyword(project_id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(keyword)))
}

pub async fn delete_keyword(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath((project_id, keyword_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    state.repo.require_owner(project_id, user.id).await?;
    state.repo.soft_delete_keyword(project_id, keyword_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
