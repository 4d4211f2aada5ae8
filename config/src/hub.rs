use crate::{
    app_config::get_config_dir,
    sheet::{
        LayoutMode,
        SheetConfig,
    },
};
use clap::Parser;
use serde::{
    Deserialize,
    Serialize,
};
use std::net::SocketAddr;
use url::Url;

/// Deskfleet telemetry hub
#[derive(Parser, Debug, Clone)]
#[command(author, version = version(), about, long_about = None)]
pub struct HubArgs {
    /// Address to listen on for agent connections and HTTP reads.
    #[clap(long, env = "DESKFLEET_HUB_ADDRESS", value_name = "ADDR")]
    pub listen_address: Option<SocketAddr>,

    /// Cap on the in-memory snapshot history backing the tabular export.
    #[clap(long, value_name = "N")]
    pub history_cap: Option<usize>,

    /// Base URL of the spreadsheet sink. Omit to serve live data only.
    #[clap(long, env = "DESKFLEET_SHEET_ENDPOINT", value_name = "URL")]
    pub sheet_endpoint: Option<Url>,

    /// Sheet layout used when exporting snapshots.
    #[clap(long, value_enum)]
    pub sheet_layout: Option<LayoutMode>,

    /// Application identifier the per-app extension flags are keyed by.
    #[clap(long, value_name = "APP")]
    pub watch_app: Option<String>,

    /// Enables verbose logging.
    #[clap(long, action)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default)]
    pub sheet_endpoint: Option<Url>,
    #[serde(default)]
    pub sheet_layout: LayoutMode,
    #[serde(default)]
    pub watch_app: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

fn default_listen_address() -> SocketAddr {
    "127.0.0.1:5000".parse().expect("static listen address")
}

fn default_history_cap() -> usize {
    10_000
}

impl HubConfig {
    pub fn new(args: HubArgs) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("listen_address", default_listen_address().to_string())?
            .set_default("history_cap", default_history_cap() as i64)?;

        let config_files = [("hub.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;

        debug!(listen = %cfg.listen_address, history_cap = cfg.history_cap, "hub configuration resolved");
        Ok(cfg)
    }

    /// The sink settings, when an endpoint is configured at all.
    pub fn sheet(&self) -> Option<SheetConfig> {
        self.sheet_endpoint.clone().map(|endpoint| SheetConfig {
            endpoint,
            layout: self.sheet_layout,
            watch_app: self.watch_app.clone(),
        })
    }
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for HubArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(listen_address) = &self.listen_address {
                cache.insert("listen_address".to_string(), listen_address.to_string().into());
            }
            if let Some(history_cap) = self.history_cap {
                cache.insert("history_cap".to_string(), (history_cap as i64).into());
            }
            if let Some(sheet_endpoint) = &self.sheet_endpoint {
                cache.insert("sheet_endpoint".to_string(), sheet_endpoint.to_string().into());
            }
            if let Some(sheet_layout) = self.sheet_layout {
                cache.insert("sheet_layout".to_string(), sheet_layout.to_string().into());
            }
            if let Some(watch_app) = &self.watch_app {
                cache.insert("watch_app".to_string(), watch_app.clone().into());
            }
            if self.verbose {
                cache.insert("verbose".to_string(), true.into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = get_config_dir().display().to_string();
    let data_dir_path = crate::app_config::get_data_dir().display().to_string();

    format!(
        "\
Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}"
    )
}
