use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Conversation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DirectRequest {
    pub user_a: Uuid,
    pub user_b: Uuid,
}

#[derive(Serialize)]
pub struct ConversationCreated {
    pub conversation_id: Uuid,
}

/// POST /api/v1/conversations/direct
/// Idempotent: the same unordered pair always yields the same conversation.
pub async fn create_direct(
    State(state): State<AppState>,
    Json(body): Json<DirectRequest>,
) -> AppResult<Json<ConversationCreated>> {
    let conversation_id = state
        .conversations
        .get_or_create_direct(body.user_a, body.user_b)
        .await?;
    Ok(Json(ConversationCreated { conversation_id }))
}

#[derive(Deserialize)]
pub struct GroupRequest {
    pub creator_id: Uuid,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

/// POST /api/v1/conversations/group
pub async fn create_group(
    State(state): State<AppState>,
    Json(body): Json<GroupRequest>,
) -> AppResult<(StatusCode, Json<ConversationCreated>)> {
    let conversation_id = state
        .conversations
        .create_group(body.creator_id, &body.participant_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(ConversationCreated { conversation_id })))
}

#[derive(Deserialize)]
pub struct ListParams {
    pub user_id: Uuid,
}

/// GET /api/v1/conversations?user_id=
/// Conversations containing the user, most recently updated first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Conversation>>> {
    Ok(Json(state.conversations.list_for_user(params.user_id).await?))
}

/// GET /api/v1/conversations/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Conversation>> {
    Ok(Json(state.conversations.get(id).await?))
}

#[derive(Deserialize)]
pub struct UserBody {
    pub user_id: Uuid,
}

/// POST /api/v1/conversations/{id}/read
/// Resets the user's unread counter to zero.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UserBody>,
) -> AppResult<StatusCode> {
    state.conversations.mark_read(id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct TypingRequest {
    pub user_id: Uuid,
    pub is_typing: bool,
}

/// POST /api/v1/conversations/{id}/typing
pub async fn set_typing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TypingRequest>,
) -> AppResult<StatusCode> {
    if !state.conversations.is_participant(id, body.user_id).await? {
        return Err(AppError::Validation(
            "user is not a participant of this conversation".into(),
        ));
    }
    state
        .presence
        .set_typing(id, body.user_id, body.is_typing)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
