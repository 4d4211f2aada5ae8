use axum::serve;
use clap::Parser;
use color_eyre::Result;
use deskfleet_config::{
    HubArgs,
    HubConfig,
};
use deskfleet_hub::{
    routes::create_router,
    sync,
    Hub,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

fn init_logging(verbose: bool) {
    color_eyre::install().expect("color_eyre init");

    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .init();
}

async fn start_server(config: HubConfig) -> Result<()> {
    let sheet_tx = config.sheet().map(sync::spawn);
    if sheet_tx.is_none() {
        tracing::info!("no sheet endpoint configured, serving live data only");
    }

    let hub = Arc::new(Hub::new(config.history_cap, config.watch_app.clone(), sheet_tx));
    let app = create_router(hub);

    tracing::info!("listening on {}", config.listen_address);

    let listener = TcpListener::bind(config.listen_address).await?;
    serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutdown requested, letting in-flight ingestion finish");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = HubArgs::parse();
    init_logging(args.verbose);

    let config = HubConfig::new(args)?;
    start_server(config).await
}
