use tracing::info;

use parley::config::Config;
use parley::error::AppError;
use parley::logging::init_tracing;
use parley::routes;
use parley::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = Config::from_env()?;
    let port = config.port;
    let state = AppState::in_memory(config);

    // Background reaper for typing entries left behind by dead clients.
    state.presence.spawn_sweeper();

    let app = routes::router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::StartServer(e.to_string()))?;
    info!(%addr, "chat core listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::StartServer(e.to_string()))?;
    Ok(())
}
