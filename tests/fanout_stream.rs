mod common;

use std::time::Duration;

use common::{register_user, test_state};
use parley::models::MessageKind;

#[tokio::test]
async fn message_subscription_delivers_snapshots_on_append() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;
    let conversation_id = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();

    let mut live = state
        .fanout
        .subscribe_messages(conversation_id)
        .await
        .unwrap();
    assert!(live.current().is_empty());

    state
        .messages
        .append(conversation_id, alice, "hi".into(), MessageKind::Text, None)
        .await
        .unwrap();

    let snapshot = live.changed().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].content, "hi");
}

#[tokio::test]
async fn cancelled_subscription_stops_delivering() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;
    let conversation_id = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();

    let mut live = state
        .fanout
        .subscribe_messages(conversation_id)
        .await
        .unwrap();
    live.cancel();
    // Give the abort a moment to land.
    tokio::time::sleep(Duration::from_millis(20)).await;

    state
        .messages
        .append(conversation_id, alice, "hi".into(), MessageKind::Text, None)
        .await
        .unwrap();
    assert!(live.changed().await.is_none());
}

#[tokio::test]
async fn conversation_list_reorders_on_activity() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;
    let carol = register_user(&state, "carol").await;

    let with_bob = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let with_carol = state
        .conversations
        .get_or_create_direct(alice, carol)
        .await
        .unwrap();

    let mut live = state.fanout.subscribe_conversations(alice).await.unwrap();
    let initial = live.current();
    assert_eq!(initial[0].id, with_carol);
    assert_eq!(initial[1].id, with_bob);

    // Activity in the older conversation moves it to the front.
    state
        .messages
        .append(with_bob, bob, "ping".into(), MessageKind::Text, None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = live.current();
    assert_eq!(snapshot[0].id, with_bob);
    assert_eq!(snapshot[0].unread[&alice], 1);
}

#[tokio::test]
async fn typing_changes_do_not_reorder_the_list() {
    let state = test_state();
    let alice = register_user(&state, "alice").await;
    let bob = register_user(&state, "bob").await;
    let carol = register_user(&state, "carol").await;

    let with_bob = state
        .conversations
        .get_or_create_direct(alice, bob)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let with_carol = state
        .conversations
        .get_or_create_direct(alice, carol)
        .await
        .unwrap();

    state
        .presence
        .set_typing(with_bob, bob, true)
        .await
        .unwrap();

    let list = state.conversations.list_for_user(alice).await.unwrap();
    assert_eq!(list[0].id, with_carol);
    assert_eq!(list[1].id, with_bob);
}
