use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::AppState;
use crate::error::AppError;
use crate::models::{Role, User};

/// Header carrying the authenticated user's id, set by the gateway in front
/// of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub User);

/// A caller whose role is `admin`.
#[derive(Debug, Clone)]
pub struct Admin(pub User);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;

        let user = state
            .repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

        Ok(Caller(user))
    }
}

impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Caller(user) = Caller::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::forbidden("Admin access required"));
        }
        Ok(Admin(user))
    }
}
