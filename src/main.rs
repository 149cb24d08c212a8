mod config;
mod error;
mod formatter;
mod generation;
mod handlers;
mod routes;
mod session;
mod state;
mod translate;

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "englishmate_backend=debug,tower_http=debug".to_string()),
        )
        .init();

    // Load configuration - first readable candidate wins
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.json".to_string()),
        exe_dir.join("conf.yaml").to_str().map(|s| s.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut loaded = None;
    for path in &config_paths {
        match Config::load(path) {
            Ok(cfg) => {
                loaded = Some((cfg, path.clone()));
                break;
            }
            Err(e) => {
                debug!("Failed to load config from {}: {}", path, e);
            }
        }
    }

    let config = match loaded {
        Some((cfg, path)) => {
            info!("Loaded configuration from: {}", path);
            cfg
        }
        None => {
            info!("No config file found (tried {:?}), using defaults", config_paths);
            Config::parse("{}", "defaults.yaml")?
        }
    };

    let app_state = AppState::new(config.clone())?;
    match config.system_config.session_idle_ttl_secs {
        0 => info!("Idle session expiry disabled"),
        ttl => {
            info!("Sessions expire after {}s idle", ttl);
            app_state
                .sessions
                .clone()
                .spawn_idle_sweeper(Duration::from_secs(ttl));
        }
    }
    let app = routes::build_app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.system_config.host, config.system_config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
