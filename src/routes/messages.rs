use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Message, MessageKind};
use crate::state::AppState;
use crate::store::BlobStore;

#[derive(Deserialize)]
pub struct AppendRequest {
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default = "default_kind")]
    pub kind: MessageKind,
    pub reply_to: Option<Uuid>,
}

fn default_kind() -> MessageKind {
    MessageKind::Text
}

#[derive(Serialize)]
pub struct MessageCreated {
    pub message_id: Uuid,
}

/// POST /api/v1/conversations/{id}/messages
pub async fn append(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<AppendRequest>,
) -> AppResult<(StatusCode, Json<MessageCreated>)> {
    let message_id = state
        .messages
        .append(
            conversation_id,
            body.sender_id,
            body.content,
            body.kind,
            body.reply_to,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageCreated { message_id })))
}

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// GET /api/v1/conversations/{id}/messages?limit=
/// The most recent page in ascending chronological order.
pub async fn list(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Message>>> {
    let page_size = params.limit.unwrap_or(state.config.message_page_size);
    Ok(Json(state.messages.list(conversation_id, page_size).await?))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// GET /api/v1/conversations/{id}/messages/search?q=
pub async fn search(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(state.messages.search(conversation_id, &params.q).await?))
}

/// DELETE /api/v1/conversations/{id}/messages/{message_id}
/// Soft delete: the content becomes a tombstone, the record survives.
pub async fn soft_delete(
    State(state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.messages.soft_delete(conversation_id, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AttachmentParams {
    pub sender_id: Uuid,
    pub filename: String,
    #[serde(default = "default_attachment_kind")]
    pub kind: MessageKind,
}

fn default_attachment_kind() -> MessageKind {
    MessageKind::Image
}

#[derive(Serialize)]
pub struct AttachmentCreated {
    pub message_id: Uuid,
    pub url: String,
}

/// POST /api/v1/conversations/{id}/attachments?sender_id=&filename=&kind=
/// Uploads the raw body, then appends a media message whose content is the
/// blob URL.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<AttachmentParams>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<AttachmentCreated>)> {
    let path = format!("{conversation_id}/{}/{}", Uuid::new_v4(), params.filename);
    let url = state.blobs.upload(&path, body).await?;
    let message_id = state
        .messages
        .append(
            conversation_id,
            params.sender_id,
            url.clone(),
            params.kind,
            None,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(AttachmentCreated { message_id, url })))
}
