use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ReceiptState;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReceiptRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/messages/{id}/delivered
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(body): Json<ReceiptRequest>,
) -> AppResult<StatusCode> {
    state.receipts.mark_delivered(message_id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(body): Json<ReceiptRequest>,
) -> AppResult<StatusCode> {
    state.receipts.mark_read(message_id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/messages/{id}/receipts
pub async fn receipt_state(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ReceiptState>> {
    Ok(Json(state.receipts.receipt_state(message_id).await?))
}
