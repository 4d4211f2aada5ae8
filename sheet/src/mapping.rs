//! The fixed metric orders shared by the hub export endpoint and both sheet
//! layouts. Order changes here would silently corrupt existing sheets, so
//! both layouts and the HTTP export read from this one place.

use chrono::{
    DateTime,
    SecondsFormat,
    Utc,
};
use deskfleet_model::Snapshot;
use serde_json::{
    json,
    Value,
};

/// Reserved label in A1 marking a sheet owned by the transposed layout.
pub const METRIC_LABEL: &str = "Metric";

const EXTENSION_SUFFIXES: [&str; 3] = ["running", "in_focus", "user_active"];

fn extension_keys(watch_app: Option<&str>) -> Vec<String> {
    match watch_app {
        Some(app) => EXTENSION_SUFFIXES
            .iter()
            .map(|suffix| format!("{app}_{suffix}"))
            .collect(),
        None => Vec::new(),
    }
}

/// Row labels for the transposed layout, in their fixed order (rows 2..N).
pub fn snapshot_metric_labels(watch_app: Option<&str>) -> Vec<String> {
    let mut labels = vec![
        "Timestamp".to_string(),
        "Idle seconds".to_string(),
        "User active".to_string(),
        "Foreground process".to_string(),
    ];
    labels.extend(extension_keys(watch_app));
    labels.push("Process count".to_string());
    labels
}

/// Cell values matching [`snapshot_metric_labels`], one per row.
pub fn snapshot_metric_cells(
    snapshot: &Snapshot,
    received_at: DateTime<Utc>,
    watch_app: Option<&str>,
) -> Vec<String> {
    let mut cells = vec![
        received_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        opt_num(snapshot.idle_seconds),
        snapshot.user_active.to_string(),
        snapshot.foreground_process.clone().unwrap_or_default(),
    ];
    for key in extension_keys(watch_app) {
        cells.push(snapshot.extension(&key).unwrap_or(false).to_string());
    }
    cells.push(snapshot.process_count().to_string());
    cells
}

/// Column headers for the append-row layout and the HTTP tabular export.
pub fn append_headers(watch_app: Option<&str>) -> Vec<String> {
    let mut headers = vec![
        "timestamp".to_string(),
        "host".to_string(),
        "idle_seconds".to_string(),
        "user_active".to_string(),
        "foreground_process".to_string(),
    ];
    headers.extend(extension_keys(watch_app));
    headers.push("process_count".to_string());
    headers
}

/// One export row as JSON values, matching [`append_headers`].
pub fn append_row_json(snapshot: &Snapshot, received_at: DateTime<Utc>, watch_app: Option<&str>) -> Vec<Value> {
    let mut row = vec![
        json!(received_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        json!(snapshot.host),
        json!(snapshot.idle_seconds),
        json!(snapshot.user_active),
        json!(snapshot.foreground_process),
    ];
    for key in extension_keys(watch_app) {
        row.push(json!(snapshot.extension(&key).unwrap_or(false)));
    }
    row.push(json!(snapshot.process_count()));
    row
}

/// One export row as sheet cells, matching [`append_headers`].
pub fn append_row_cells(snapshot: &Snapshot, received_at: DateTime<Utc>, watch_app: Option<&str>) -> Vec<String> {
    append_row_json(snapshot, received_at, watch_app)
        .into_iter()
        .map(|value| match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
