//! # Deskfleet Agent - Main Entry Point
//!
//! The push half of the fleet telemetry system: a lightweight process on
//! every monitored workstation that opens a persistent connection to the
//! hub, registers its host identity, and streams periodic snapshots
//! (idle time, foreground window, process inventory, watched-app flags).

mod probe;

use clap::Parser;
use color_eyre::Result;
use deskfleet_model::{
    AgentMessage,
    HubMessage,
};
use futures::{
    SinkExt,
    StreamExt,
};
use probe::Prober;
use std::time::Duration;
use sysinfo::System;
use tokio::time::sleep;
use tokio_tungstenite::{
    connect_async,
    tungstenite::Message,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};
use url::Url;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "deskfleet-agent")]
#[command(about = "Workstation telemetry agent")]
#[command(version)]
struct Cli {
    /// Hub base URL (e.g. http://hub.internal:5000)
    #[arg(long, env = "DESKFLEET_SERVER_URL")]
    server_url: Url,

    /// Host identity to report under; defaults to this machine's hostname
    #[arg(long, env = "DESKFLEET_HOST")]
    host: Option<String>,

    /// Snapshot interval (e.g. "5s", "1m")
    #[arg(long, default_value = "5s")]
    interval: String,

    /// Idle threshold in seconds below which the user counts as active
    #[arg(long, default_value_t = 30.0)]
    idle_threshold: f64,

    /// Application identifier to derive the per-app flags for
    #[arg(long, value_name = "APP")]
    watch_app: Option<String>,

    /// Maximum number of processes reported per snapshot
    #[arg(long, default_value_t = 50)]
    process_limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("deskfleet_agent={log_level}"))
        .init();

    color_eyre::install()?;

    let host = cli
        .host
        .clone()
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown-host".to_string());
    let interval = humantime::parse_duration(&cli.interval)
        .map_err(|e| eyre::eyre!("Invalid interval '{}': {}", cli.interval, e))?;
    let ws_url = websocket_url(&cli.server_url)?;

    info!("reporting as host {host} to {ws_url}, every {:?}", interval);

    let mut prober = Prober::new(cli.process_limit, cli.idle_threshold, cli.watch_app.clone());

    // Reconnect forever; the hub treats a re-registration of the same host
    // identity as superseding the stale session.
    loop {
        match session(&ws_url, &host, interval, &mut prober).await {
            Ok(()) => {
                info!("agent stopped");
                return Ok(());
            }
            Err(e) => {
                error!("connection lost: {e}, retrying in {:?}", RECONNECT_DELAY);
                sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// One connected session: register, then stream snapshots until the
/// connection drops or shutdown is requested.
async fn session(ws_url: &Url, host: &str, interval: Duration, prober: &mut Prober) -> Result<()> {
    let (ws, _response) = connect_async(ws_url.as_str()).await?;
    info!("connected to hub");
    let (mut sink, mut stream) = ws.split();

    let register = AgentMessage::Register {
        host: host.to_string(),
    };
    sink.send(Message::Text(serde_json::to_string(&register)?.into()))
        .await?;

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                let _ = sink.send(Message::Close(None)).await;
                return Ok(());
            }
            _ = ticker.tick() => {
                let snapshot = prober.snapshot(host).await;
                debug!(processes = snapshot.process_count(), idle = ?snapshot.idle_seconds, "sending snapshot");
                let message = AgentMessage::Snapshot(snapshot);
                sink.send(Message::Text(serde_json::to_string(&message)?.into())).await?;
            }
            message = stream.next() => {
                let Some(message) = message else {
                    return Err(eyre::eyre!("hub closed the connection"));
                };
                handle_hub_message(message?)?;
            }
        }
    }
}

fn handle_hub_message(message: Message) -> Result<()> {
    let Message::Text(text) = message else {
        return Ok(());
    };
    match serde_json::from_str::<HubMessage>(&text) {
        Ok(HubMessage::Registered { host }) => info!("registered as {host}"),
        Ok(HubMessage::HostList { hosts }) => debug!(count = hosts.len(), "fleet roster update"),
        Ok(HubMessage::Error { message }) => warn!("hub reported an error: {message}"),
        Ok(_) => {}
        Err(e) => debug!("unrecognized hub message: {e}"),
    }
    Ok(())
}

/// `http(s)` base URL -> `ws(s)` URL of the hub's agent endpoint.
fn websocket_url(server_url: &Url) -> Result<Url> {
    let mut url = server_url.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(eyre::eyre!("unsupported hub URL scheme: {other}")),
    };
    url.set_scheme(scheme)
        .map_err(|()| eyre::eyre!("cannot rewrite hub URL scheme"))?;
    url.set_path("/ws");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hub_urls_map_onto_the_agent_endpoint() {
        let url = websocket_url(&"http://hub.internal:5000".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "ws://hub.internal:5000/ws");

        let url = websocket_url(&"https://hub.internal/base".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "wss://hub.internal/ws");
    }

    #[test]
    fn unknown_schemes_are_rejected() {
        assert!(websocket_url(&"ftp://hub.internal".parse().unwrap()).is_err());
    }
}
