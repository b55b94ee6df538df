use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::{ApiJson, ApiPath, AppState, Caller};
use crate::error::{AppError, Result};
use crate::models::{NewProject, Project, UpdateProject, UpdateUser, User};

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
}

pub async fn me(Caller(user): Caller) -> Json<User> {
    Json(user)
}

pub async fn update_me(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiJson(payload): ApiJson<UpdateUser>,
) -> Result<Json<User>> {
    let update = UpdateUser {
        username: payload.username.map(|name| name.trim().to_string()),
        email: payload.email.map(|email| email.trim().to_string()),
    };
    if update.username.as_deref().is_some_and(|name| name.chars().count() < 3) {
        return Err(AppError::validation(
            "Username must be at least 3 characters",
        ));
    }
    if update
        .email
        .as_deref()
        .is_some_and(|email| !email.contains('@'))
    {
        return Err(AppError::validation("Invalid email address"));
    }

    let updated = state.repo.update_user(user.id, update).await?;
    tracing::info!("User {} updated their profile", user.id);
    Ok(Json(updated))
}

pub async fn create_project(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiJson(payload): ApiJson<NewProject>,
) -> Result<(StatusCode, Json<Project>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Project name cannot be empty"));
    }
    if payload.topic.trim().is_empty() {
        return Err(AppError::validation("Project topic cannot be empty"));
    }

    let project = state
        .repo
        .create_project(user.id, payload, state.config.project_limit_policy)
        .await?;

    tracing::info!("User {} created project {}", user.id, project.id);
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.repo.projects_for_user(user.id).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Project>> {
    Ok(Json(state.repo.require_access(id, user.id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateProject>,
) -> Result<Json<Project>> {
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::validation("Project name cannot be empty"));
    }

    state.repo.require_access(id, user.id).await?;
    Ok(Json(state.repo.update_project(id, payload).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.repo.require_owner(id, user.id).await?;
    state.repo.delete_project(id).await?;

    tracing::info!("User {} deleted project {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<User>>> {
    state.repo.require_owner(id, user.id).await?;
    Ok(Json(state.repo.list_members(id).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let project = state.repo.require_owner(id, user.id).await?;

    let member = state
        .repo
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| AppError::validation("User with this email not found"))?;
    if member.id == project.owner_id {
        return Err(AppError::already_exists("User is the owner of this project"));
    }

    state.repo.add_member(id, member.id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath((id, member_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    let project = state.repo.require_owner(id, user.id).await?;
    if member_id == project.owner_id {
        return Err(AppError::validation("Cannot remove the project owner"));
    }

    if !state.repo.remove_member(id, member_id).await? {
        return Err(AppError::validation("User is not a member of this project"));
    }
    Ok(StatusCode::NO_CONTENT)
}
