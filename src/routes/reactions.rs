use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub user_id: Uuid,
    pub emoji: String,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub emoji: String,
    /// True when the reaction is present after the toggle.
    pub active: bool,
}

/// POST /api/v1/messages/{id}/reactions
pub async fn toggle(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(body): Json<ToggleRequest>,
) -> AppResult<Json<ToggleResponse>> {
    let active = state
        .reactions
        .toggle(message_id, body.user_id, &body.emoji)
        .await?;
    Ok(Json(ToggleResponse {
        emoji: body.emoji,
        active,
    }))
}

#[derive(Serialize)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<Uuid>,
}

/// GET /api/v1/messages/{id}/reactions
pub async fn list(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReactionCount>>> {
    let reactions = state.reactions.reactions(message_id).await?;
    let counts = reactions
        .into_iter()
        .map(|(emoji, users)| ReactionCount {
            emoji,
            count: users.len(),
            user_ids: users.into_iter().collect(),
        })
        .collect();
    Ok(Json(counts))
}
