//! ELM327 Emulator
//!
//! Speaks enough ELM327 over TCP for bridge development and e2e tests
//! without hardware: AT configuration commands, adapter identity, and
//! mode-01 PIDs backed by a shared random-walk engine model.
//!
//! # Usage
//!
//! ```bash
//! ./elm-sim --listen 0.0.0.0:35000 --update-interval-ms 200
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

mod adapter;
mod engine;

use adapter::Adapter;
use engine::SimulatedEngine;

#[derive(Parser, Debug)]
#[command(name = "elm-sim")]
#[command(about = "ELM327 emulator for OBD bridge development")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:35000")]
    listen: String,

    /// Engine model update interval in milliseconds
    #[arg(long, default_value_t = 200)]
    update_interval_ms: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose {
        "elm_sim=debug"
    } else {
        "elm_sim=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine = Arc::new(SimulatedEngine::new());
    let running = Arc::new(AtomicBool::new(true));

    // Engine update task
    let engine_for_update = engine.clone();
    let running_for_update = running.clone();
    let update_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(args.update_interval_ms));
        while running_for_update.load(Ordering::SeqCst) {
            interval.tick().await;
            engine_for_update.update();
        }
    });

    let listener = TcpListener::bind(&args.listen).await?;
    info!("ELM327 emulator listening on {}", args.listen);
    info!("Press Ctrl+C to stop");

    // Accept loop
    let accept_handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "Client connected");
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, engine).await {
                            debug!(error = %e, "Client connection error");
                        }
                        info!(%peer, "Client disconnected");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                }
            }
        }
    });

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    running.store(false, Ordering::SeqCst);
    accept_handle.abort();
    let _ = tokio::time::timeout(Duration::from_secs(2), update_handle).await;

    Ok(())
}

/// One connection: accumulate bytes to `\r`, answer each command line.
/// An empty line (the bridge's liveness probe) gets no reply.
async fn handle_client(mut stream: TcpStream, engine: Arc<SimulatedEngine>) -> std::io::Result<()> {
    let mut adapter = Adapter::new(engine);
    let mut pending = Vec::new();
    let mut chunk = [0u8; 256];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // peer closed
            return Ok(());
        }
        for &byte in &chunk[..n] {
            match byte {
                b'\r' => {
                    let command = String::from_utf8_lossy(&pending).trim().to_uppercase();
                    pending.clear();
                    if command.is_empty() {
                        continue;
                    }
                    debug!(command = %command, "RX");
                    let response = adapter.respond(&command);
                    debug!(response = ?response, "TX");
                    stream.write_all(response.as_bytes()).await?;
                }
                // linefeeds are ignored
                b'\n' => {}
                _ => pending.push(byte),
            }
        }
    }
}
