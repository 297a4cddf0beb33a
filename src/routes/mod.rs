use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub mod conversations;
pub mod messages;
pub mod reactions;
pub mod receipts;
pub mod users;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/users", post(users::register))
        .route(
            "/api/v1/conversations/direct",
            post(conversations::create_direct),
        )
        .route(
            "/api/v1/conversations/group",
            post(conversations::create_group),
        )
        .route("/api/v1/conversations", get(conversations::list))
        .route("/api/v1/conversations/:id", get(conversations::get))
        .route(
            "/api/v1/conversations/:id/read",
            post(conversations::mark_read),
        )
        .route(
            "/api/v1/conversations/:id/typing",
            post(conversations::set_typing),
        )
        .route(
            "/api/v1/conversations/:id/messages",
            post(messages::append).get(messages::list),
        )
        .route(
            "/api/v1/conversations/:id/messages/search",
            get(messages::search),
        )
        .route(
            "/api/v1/conversations/:id/messages/:message_id",
            delete(messages::soft_delete),
        )
        .route(
            "/api/v1/conversations/:id/attachments",
            post(messages::upload_attachment),
        )
        .route("/api/v1/messages/:id/delivered", post(receipts::mark_delivered))
        .route("/api/v1/messages/:id/read", post(receipts::mark_read))
        .route("/api/v1/messages/:id/receipts", get(receipts::receipt_state))
        .route(
            "/api/v1/messages/:id/reactions",
            post(reactions::toggle).get(reactions::list),
        )
        .route("/api/v1/ws", get(crate::websocket::conversation_socket))
        .route(
            "/api/v1/ws/conversations",
            get(crate::websocket::conversation_list_socket),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
