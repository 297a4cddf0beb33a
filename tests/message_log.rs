mod common;

use common::{register_user, test_state};
use parley::models::{MessageKind, TOMBSTONE};
use parley::state::AppState;
use uuid::Uuid;

async fn direct_pair(state: &AppState) -> (Uuid, Uuid, Uuid) {
    let alice = register_user(state, "alice").await;
    let bob = register_user(state, "bob").await;
    let conversation_id = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();
    (conversation_id, alice, bob)
}

#[tokio::test]
async fn messages_come_back_in_send_order() {
    let state = test_state();
    let (conversation_id, alice, bob) = direct_pair(&state).await;

    for (sender, content) in [(alice, "one"), (bob, "two"), (alice, "three")] {
        state
            .messages
            .append(
                conversation_id,
                sender,
                content.into(),
                MessageKind::Text,
                None,
            )
            .await
            .unwrap();
    }

    let log = state.messages.list(conversation_id, 50).await.unwrap();
    let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn list_returns_only_the_most_recent_page() {
    let state = test_state();
    let (conversation_id, alice, _) = direct_pair(&state).await;

    for i in 0..10 {
        state
            .messages
            .append(
                conversation_id,
                alice,
                format!("msg {i}"),
                MessageKind::Text,
                None,
            )
            .await
            .unwrap();
    }

    let page = state.messages.list(conversation_id, 3).await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].content, "msg 7");
    assert_eq!(page[2].content, "msg 9");
}

#[tokio::test]
async fn soft_delete_keeps_the_record_and_tombstones_the_content() {
    let state = test_state();
    let (conversation_id, alice, _) = direct_pair(&state).await;

    let message_id = state
        .messages
        .append(
            conversation_id,
            alice,
            "secret".into(),
            MessageKind::Text,
            None,
        )
        .await
        .unwrap();
    let before = state.messages.get(message_id).await.unwrap();

    state
        .messages
        .soft_delete(conversation_id, message_id)
        .await
        .unwrap();

    let after = state.messages.get(message_id).await.unwrap();
    assert_eq!(after.content, TOMBSTONE);
    assert_eq!(after.id, before.id);
    assert_eq!(after.sender_id, before.sender_id);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn soft_delete_rejects_a_mismatched_conversation() {
    let state = test_state();
    let (conversation_id, alice, _) = direct_pair(&state).await;
    let message_id = state
        .messages
        .append(conversation_id, alice, "hi".into(), MessageKind::Text, None)
        .await
        .unwrap();
    assert!(state
        .messages
        .soft_delete(Uuid::new_v4(), message_id)
        .await
        .is_err());
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let state = test_state();
    let (conversation_id, alice, bob) = direct_pair(&state).await;

    for (sender, content) in [
        (alice, "Lunch tomorrow?"),
        (bob, "sure, where?"),
        (alice, "the LUNCH place on 5th"),
    ] {
        state
            .messages
            .append(
                conversation_id,
                sender,
                content.into(),
                MessageKind::Text,
                None,
            )
            .await
            .unwrap();
    }

    let hits = state.messages.search(conversation_id, "lunch").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(state.messages.search(conversation_id, "").await.is_err());
}

#[tokio::test]
async fn empty_content_and_non_participants_are_rejected() {
    let state = test_state();
    let (conversation_id, _, _) = direct_pair(&state).await;
    let outsider = register_user(&state, "mallory").await;

    assert!(state
        .messages
        .append(
            conversation_id,
            outsider,
            "hi".into(),
            MessageKind::Text,
            None
        )
        .await
        .is_err());

    let (conversation_id, alice, _) = direct_pair(&state).await;
    assert!(state
        .messages
        .append(
            conversation_id,
            alice,
            "   ".into(),
            MessageKind::Text,
            None
        )
        .await
        .is_err());
}

#[tokio::test]
async fn preview_truncates_text_and_labels_media() {
    let state = test_state();
    let (conversation_id, alice, _) = direct_pair(&state).await;

    state
        .messages
        .append(
            conversation_id,
            alice,
            "y".repeat(150),
            MessageKind::Text,
            None,
        )
        .await
        .unwrap();
    let conversation = state.conversations.get(conversation_id).await.unwrap();
    let summary = conversation.last_message.unwrap();
    assert_eq!(summary.content.chars().count(), 100);

    state
        .messages
        .append(
            conversation_id,
            alice,
            "mem://pic.png".into(),
            MessageKind::Image,
            None,
        )
        .await
        .unwrap();
    let conversation = state.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.last_message.unwrap().content, "[image]");
}

#[tokio::test]
async fn replies_carry_a_weak_reference() {
    let state = test_state();
    let (conversation_id, alice, bob) = direct_pair(&state).await;

    let original = state
        .messages
        .append(conversation_id, alice, "hi".into(), MessageKind::Text, None)
        .await
        .unwrap();
    let reply = state
        .messages
        .append(
            conversation_id,
            bob,
            "hello".into(),
            MessageKind::Text,
            Some(original),
        )
        .await
        .unwrap();

    assert_eq!(
        state.messages.get(reply).await.unwrap().reply_to,
        Some(original)
    );
}
