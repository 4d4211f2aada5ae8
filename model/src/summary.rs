use crate::snapshot::Snapshot;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Per-host projection of the latest snapshot, served by the hub's summary
/// endpoint. A host that registered but has not reported yet shows up with
/// every field null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryView {
    pub ts: Option<DateTime<Utc>>,
    pub idle_seconds: Option<f64>,
    pub user_active: Option<bool>,
    pub process_count: Option<usize>,
    pub foreground_process: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, bool>,
}

impl SummaryView {
    pub fn from_snapshot(snapshot: Option<&Snapshot>, received_at: Option<DateTime<Utc>>) -> Self {
        match snapshot {
            Some(snapshot) => Self {
                ts: received_at,
                idle_seconds: snapshot.idle_seconds,
                user_active: Some(snapshot.user_active),
                process_count: Some(snapshot.process_count()),
                foreground_process: snapshot.foreground_process.clone(),
                extensions: snapshot.extensions.clone(),
            },
            None => Self::default(),
        }
    }
}
