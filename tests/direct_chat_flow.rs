mod common;

use common::{register_user, test_state};
use parley::models::{ConversationKind, MessageKind};

#[tokio::test]
async fn sending_a_message_updates_unread_and_summary() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;

    let conversation_id = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();

    state
        .messages
        .append(conversation_id, alice, "hi".into(), MessageKind::Text, None)
        .await
        .unwrap();

    let conversation = state.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.unread[&bob], 1);
    assert_eq!(conversation.unread[&alice], 0);
    let summary = conversation.last_message.unwrap();
    assert_eq!(summary.content, "hi");
    assert_eq!(summary.sender_id, alice);
}

#[tokio::test]
async fn direct_conversation_is_deduplicated_in_both_orders() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;

    let first = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();
    let second = state
        .conversations
        .get_or_create_direct(bob, alice)
        .await
        .unwrap();
    assert_eq!(first, second);

    let conversation = state.conversations.get(first).await.unwrap();
    assert_eq!(conversation.kind, ConversationKind::Direct);
    assert_eq!(conversation.participants.len(), 2);
}

#[tokio::test]
async fn self_conversation_is_rejected() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    assert!(state
        .conversations
        .get_or_create_direct(alice, alice)
        .await
        .is_err());
}

#[tokio::test]
async fn unknown_user_cannot_open_a_conversation() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let stranger = uuid::Uuid::new_v4();
    assert!(state
        .conversations
        .get_or_create_direct(alice, stranger)
        .await
        .is_err());
}

#[tokio::test]
async fn group_creator_is_always_a_member_and_deduplicated() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;

    let conversation_id = state
        .conversations
        .create_group(alice, &[alice, bob, bob])
        .await
        .unwrap();

    let conversation = state.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.kind, ConversationKind::Group);
    assert_eq!(conversation.participants, vec![alice, bob]);
}

#[tokio::test]
async fn mark_read_resets_the_unread_counter() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;
    let conversation_id = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();

    for content in ["one", "two", "three"] {
        state
            .messages
            .append(
                conversation_id,
                alice,
                content.into(),
                MessageKind::Text,
                None,
            )
            .await
            .unwrap();
    }
    let conversation = state.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.unread[&bob], 3);

    state
        .conversations
        .mark_read(conversation_id, bob)
        .await
        .unwrap();
    let conversation = state.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.unread[&bob], 0);
}
