//! herald-relay: development broker for the presence bus.
//!
//! Accepts WebSocket connections, acknowledges registrations, keeps
//! per-location presence counts and relays topic messages to subscribers.

mod connection;
mod hub;
mod protocol;

use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;
use crate::hub::Hub;

#[derive(Parser)]
#[command(name = "herald-relay", about = "Development broker for the herald presence bus")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Seconds of silence after which a connection is dropped.
    #[arg(long, default_value_t = 30)]
    idle_timeout: u64,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_relay=info".into()),
        )
        .init();

    let args = Args::parse();
    let hub = Hub::new();

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("herald-relay listening on {}", addr);

    let reaper_hub = hub.clone();
    let max_idle = Duration::from_secs(args.idle_timeout);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            reaper_hub.reap_idle(max_idle).await;
            let count = reaper_hub.count().await;
            let present = reaper_hub.counts().await.total;
            tracing::debug!(connections = count, present, "Reaper tick");
        }
    });

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let hub = hub.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, hub).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
