//! Focus Timer - A countdown timer engine served over HTTP
//!
//! This is the main entry point for the focus-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use focus_timer::{
    api::create_router,
    config::Config,
    services::{CommandCue, CompletionCue, JsonFileRepository, MemoryRepository, SilentCue, TimerRepository},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, background={}",
          config.host, config.port, config.background);

    let cue: Arc<dyn CompletionCue> = if config.silent {
        Arc::new(SilentCue)
    } else {
        if !config.sound.is_file() {
            warn!("Sound file {} not found, completion will be silent", config.sound.display());
        }
        Arc::new(CommandCue::new(config.player.clone(), config.sound.clone()))
    };

    let repository: Arc<dyn TimerRepository> = match config.store_path() {
        Some(path) => {
            info!("Saved timers stored in {}", path.display());
            Arc::new(JsonFileRepository::new(path))
        }
        None => {
            info!("Saved timers kept in memory for this run");
            Arc::new(MemoryRepository::new())
        }
    };

    // Create application state
    let state = Arc::new(
        AppState::new(config.port, config.host.clone())
            .with_cue(cue)
            .with_repository(repository)
            .with_background(config.background),
    );

    if let Err(e) = state.restore() {
        warn!("Could not restore saved timers, starting fresh: {}", e);
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timer                    - Current timer");
    info!("  POST   /timer/preset/:preset     - Select pomodoro | minute90 | minute5217 | custom");
    info!("  POST   /timer/saved/:id/select   - Select a saved timer");
    info!("  POST   /timer/start|pause|toggle|stop|reset|leave");
    info!("  PUT    /timer/custom             - Set custom hours/minutes/seconds");
    info!("  PUT    /timer/label              - Set timer label");
    info!("  POST   /timer/save               - Save current time under a label");
    info!("  GET    /timers/saved             - List saved timers");
    info!("  POST   /timers/saved/:id/edit    - Edit a saved timer");
    info!("  DELETE /timers/saved/:id?confirm=true - Delete a saved timer");
    info!("  GET    /presets | /status | /health");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
