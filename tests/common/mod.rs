use std::time::Duration;

use parley::config::Config;
use parley::identity::UserProfile;
use parley::state::AppState;
use uuid::Uuid;

/// Fully wired in-memory state with a short typing window so staleness is
/// observable without multi-second sleeps.
pub fn test_state() -> AppState {
    let mut config = Config::test_defaults();
    config.typing_window = Duration::from_millis(300);
    AppState::in_memory(config)
}

pub async fn register_user(state: &AppState, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    state
        .directory
        .register(UserProfile {
            id,
            display_name: name.to_string(),
            avatar_url: None,
        })
        .await;
    id
}
