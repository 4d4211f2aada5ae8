use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;
use url::Url;

/// How hub-side snapshot export lays the sheet out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LayoutMode {
    /// One column per host, fixed metric labels down column A.
    #[default]
    Transposed,
    /// One appended row per snapshot, fixed header order.
    AppendRow,
}

/// How the polling collector writes its full table each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExportMode {
    /// One column per host, same allocator as the hub layout.
    #[default]
    Transposed,
    /// Clear and rewrite the whole table as rows.
    Rewrite,
}

/// Connection settings for the external spreadsheet-style sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub endpoint: Url,
    #[serde(default)]
    pub layout: LayoutMode,
    /// Application identifier the per-app extension flags are keyed by.
    #[serde(default)]
    pub watch_app: Option<String>,
}
