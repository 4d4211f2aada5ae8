//! # Deskfleet Collector - Main Entry Point
//!
//! Runs the pull-based collection cycle against every host the directory
//! service lists:
//!
//! 1. Resolving the monitored scope via the configured discovery command
//! 2. Querying each host over the remote-execution channel (process list,
//!    idle time, CPU load, memory load)
//! 3. Overwriting the in-memory fleet table
//! 4. Writing the full table to the spreadsheet sink

use clap::Parser;
use color_eyre::Result;
use deskfleet_collector::{
    display,
    Collector,
    CommandDiscovery,
    FleetExport,
    ShellExec,
};
use deskfleet_config::ExportMode;
use std::{
    sync::Arc,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};
use url::Url;

#[derive(Parser)]
#[command(name = "deskfleet-collector")]
#[command(about = "Directory-driven remote polling collector")]
#[command(version)]
struct Cli {
    /// Command resolving the monitored scope, one hostname per line
    /// (e.g. an ldapsearch or AD query wrapped in a script)
    #[arg(long, env = "DESKFLEET_DISCOVERY_COMMAND")]
    discovery_command: String,

    /// Remote-execution template; `{host}` and `{command}` are substituted
    #[arg(long, env = "DESKFLEET_RUNNER_TEMPLATE", default_value = "ssh {host} {command}")]
    runner_template: String,

    /// Collection interval (e.g. "60s", "5m")
    #[arg(long, default_value = "60s")]
    interval: String,

    /// Per-query timeout; a timed-out query counts as failed
    #[arg(long, default_value = "15s")]
    query_timeout: String,

    /// Maximum number of hosts probed concurrently
    #[arg(long, default_value_t = 4)]
    parallelism: usize,

    /// Base URL of the spreadsheet sink (optional)
    #[arg(long, env = "DESKFLEET_SHEET_ENDPOINT")]
    sheet_endpoint: Option<Url>,

    /// How the fleet table is written to the sink
    #[arg(long, value_enum, default_value_t = ExportMode::Transposed)]
    export_mode: ExportMode,

    /// Render the fleet table to the terminal after every cycle
    #[arg(long)]
    table: bool,

    /// Run a single collection cycle, print the table, and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("deskfleet_collector={log_level}"))
        .init();

    color_eyre::install()?;

    let interval = parse_duration(&cli.interval)?;
    let query_timeout = parse_duration(&cli.query_timeout)?;

    info!("starting deskfleet collector");
    info!("discovery command: {}", cli.discovery_command);
    info!("runner template: {}", cli.runner_template);
    info!("interval: {:?}, query timeout: {:?}", interval, query_timeout);

    let export = match &cli.sheet_endpoint {
        Some(endpoint) => match FleetExport::from_endpoint(endpoint.clone(), cli.export_mode) {
            Ok(export) => Some(export),
            Err(e) => {
                warn!(error = %e, "sheet sink unusable, collecting without export");
                None
            }
        },
        None => {
            info!("no sheet endpoint configured, collecting without export");
            None
        }
    };

    let discovery = Box::new(CommandDiscovery::new(cli.discovery_command));
    let exec = Arc::new(ShellExec::new(cli.runner_template, query_timeout));
    let mut collector = Collector::new(discovery, exec, export, cli.parallelism, cli.table);

    if cli.once {
        collector.run_cycle().await;
        println!("{}", display::render(collector.state()));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, stopping after the current cycle");
            signal_cancel.cancel();
        }
    });

    collector.run(interval, cancel).await;
    info!("collector stopped");
    Ok(())
}

fn parse_duration(duration_str: &str) -> Result<Duration> {
    humantime::parse_duration(duration_str)
        .map_err(|e| eyre::eyre!("Invalid duration '{}': {}", duration_str, e))
}
