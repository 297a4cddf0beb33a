use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Freshness window for typing signals. A signal older than this is
    /// treated as stale by consumers even if it is still stored.
    pub typing_window: Duration,
    /// Default number of messages returned by a list call.
    pub message_page_size: usize,
    /// Maximum characters of a text message carried into the conversation's
    /// last-message preview.
    pub preview_max_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let typing_window_secs: u64 = env::var("TYPING_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);
        if typing_window_secs == 0 {
            return Err(crate::error::AppError::Config(
                "TYPING_WINDOW_SECS must be positive".into(),
            ));
        }

        let message_page_size = env::var("MESSAGE_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50);
        let preview_max_chars = env::var("PREVIEW_MAX_CHARS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Ok(Self {
            port,
            typing_window: Duration::from_secs(typing_window_secs),
            message_page_size,
            preview_max_chars,
        })
    }

    /// Defaults for tests; no environment is consulted.
    pub fn test_defaults() -> Self {
        Self {
            port: 3000,
            typing_window: Duration::from_secs(3),
            message_page_size: 50,
            preview_max_chars: 100,
        }
    }
}
