use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::identity::UserProfile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub id: Option<Uuid>,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// POST /api/v1/users
/// Register a profile with the in-memory directory.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    if body.display_name.trim().is_empty() {
        return Err(AppError::Validation("display_name cannot be empty".into()));
    }
    let profile = UserProfile {
        id: body.id.unwrap_or_else(Uuid::new_v4),
        display_name: body.display_name,
        avatar_url: body.avatar_url,
    };
    state.directory.register(profile.clone()).await;
    Ok((StatusCode::CREATED, Json(profile)))
}
