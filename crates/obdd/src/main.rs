//! obdd - OBD-II telemetry bridge daemon
//!
//! Bridges an ELM327-class OBD adapter to WebSocket dashboards: one shared
//! device session, decoded telemetry pushed as JSON.
//!
//! Usage:
//!   obdd [config.toml]
//!
//! All settings have defaults; with no config file the daemon polls an
//! adapter at host.docker.internal:35000 and listens on 0.0.0.0:8000.

use obd_api::{create_router, AppState};
use obd_elm::create_link;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::ObddConfig;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args { config_path: None };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"obdd - OBD-II telemetry bridge daemon

Usage: obdd [config.toml]

Options:
  -h, --help    Print this help message

Environment:
  OBDD_LISTEN        Override the HTTP listen address
  OBDD_DEVICE_HOST   Override the adapter host
  OBDD_DEVICE_PORT   Override the adapter port

Examples:
  # Run with defaults (adapter at host.docker.internal:35000)
  obdd

  # Run with a config file
  obdd config.toml

  # Point at a local emulator
  OBDD_DEVICE_HOST=127.0.0.1 obdd
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "obdd=info,obd_api=info,obd_elm=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting obdd (OBD-II telemetry bridge)");

    let args = parse_args();

    let mut config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        ObddConfig::load(path)?
    } else {
        tracing::info!("No config file provided, using defaults");
        ObddConfig::default()
    };
    config.apply_env_overrides();

    // The link is lazy: an unreachable adapter must not keep the daemon
    // from starting, clients just see degraded payloads until it appears.
    let link = create_link(&config.device);
    tracing::info!(endpoint = %link.endpoint(), "Device link configured");

    let state = AppState::new(link, config.telemetry);
    let app = create_router(state);

    tracing::info!("Listening on http://{}", config.server.listen);
    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
