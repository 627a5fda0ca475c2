mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sahayogi_auth::{gate, GateAction, GotrueClient, GotrueConfig, SessionManager, SessionManagerConfig};
use sahayogi_config::SahayogiConfig;
use sahayogi_tutor::{Conversation, HttpTutorClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let config = match &args.config {
        Some(path) => sahayogi_config::load_from_path(Path::new(path)),
        None => sahayogi_config::load_config(),
    }
    .unwrap_or_else(|e| {
        eprintln!("config load failed, using defaults: {e}");
        SahayogiConfig::default()
    });

    let directive = args.log_filter.as_deref().unwrap_or(&config.logging.filter);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Sahayogi v{} starting", env!("CARGO_PKG_VERSION"));

    let auth = build_session_manager(&config);
    auth.initialize().await;

    let mut state_rx = auth.watch_state();
    if gate::resolve(&mut state_rx).await != GateAction::Render {
        if !repl::login(&auth).await {
            auth.shutdown();
            return;
        }
    }

    let tutor = HttpTutorClient::new(config.backend.base_url.clone())
        .with_timeout(Duration::from_secs(config.backend.request_timeout_secs));
    let conversation = Conversation::new(Arc::new(tutor), auth.clone());

    repl::run(conversation, &auth).await;
    auth.shutdown();
}

fn build_session_manager(config: &SahayogiConfig) -> SessionManager {
    let mut gotrue = GotrueConfig::new(&config.auth.project_url, &config.auth.anon_key);

    let session_file = config.auth.session_file.clone().or_else(|| {
        sahayogi_config::default_config_path()
            .ok()
            .and_then(|p| p.parent().map(|dir| dir.join("session.json")))
    });
    if let Some(path) = session_file {
        gotrue = gotrue.with_session_file(path);
    }

    SessionManager::new(
        Arc::new(GotrueClient::new(gotrue)),
        SessionManagerConfig {
            auto_refresh: config.auth.auto_refresh,
            refresh_margin: Duration::from_secs(config.auth.refresh_margin_secs),
        },
    )
}
