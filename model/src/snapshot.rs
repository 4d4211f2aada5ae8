use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// One entry of a host's process inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: String,
    pub status: String,
}

/// One telemetry reading for a host.
///
/// `idle_seconds` and `foreground_process` are absent when the corresponding
/// probe is unavailable on the reporting platform. The extension map carries
/// the flattened per-application flags (`<app>_running`, `<app>_in_focus`,
/// `<app>_user_active`) exactly as they appear on the wire. Snapshots are
/// never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub host: String,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub idle_seconds: Option<f64>,
    #[serde(default)]
    pub user_active: bool,
    #[serde(default)]
    pub processes: Vec<ProcessInfo>,
    #[serde(default)]
    pub foreground_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    process_count: Option<usize>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, bool>,
}

impl Snapshot {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            captured_at: Utc::now(),
            idle_seconds: None,
            user_active: false,
            processes: Vec::new(),
            foreground_process: None,
            process_count: None,
            extensions: BTreeMap::new(),
        }
    }

    /// The submitted count when the agent sent one, otherwise the inventory
    /// length.
    pub fn process_count(&self) -> usize {
        self.process_count.unwrap_or(self.processes.len())
    }

    pub fn extension(&self, key: &str) -> Option<bool> {
        self.extensions.get(key).copied()
    }

    /// Whether idle time stayed below `threshold` seconds. Unknown idle time
    /// counts as inactive, matching the agent-side derivation.
    pub fn derive_user_active(idle_seconds: Option<f64>, threshold: f64) -> bool {
        idle_seconds.is_some_and(|idle| idle < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_payload_with_flattened_flags() {
        let payload = serde_json::json!({
            "host": "pc-01",
            "idle_seconds": 5.0,
            "user_active": true,
            "processes": [
                {"pid": 100, "name": "calc.exe", "status": "running"},
                {"pid": 200, "name": "excel.exe", "status": "running"},
            ],
            "foreground_process": "excel.exe",
            "excel_running": true,
            "excel_in_focus": true,
            "excel_user_active": true,
        });

        let snapshot: Snapshot = serde_json::from_value(payload).unwrap();
        assert_eq!(snapshot.host, "pc-01");
        assert_eq!(snapshot.idle_seconds, Some(5.0));
        assert_eq!(snapshot.process_count(), 2);
        assert_eq!(snapshot.extension("excel_running"), Some(true));
        assert_eq!(snapshot.extension("excel_in_focus"), Some(true));
        assert_eq!(snapshot.extension("word_running"), None);
    }

    #[test]
    fn submitted_process_count_wins_over_inventory_length() {
        let payload = serde_json::json!({
            "host": "pc-02",
            "processes": [],
            "process_count": 142,
        });

        let snapshot: Snapshot = serde_json::from_value(payload).unwrap();
        assert_eq!(snapshot.process_count(), 142);
    }

    #[test]
    fn payload_without_host_is_rejected() {
        let payload = serde_json::json!({ "idle_seconds": 1.0 });
        assert!(serde_json::from_value::<Snapshot>(payload).is_err());
    }

    #[test]
    fn missing_idle_probe_counts_as_inactive() {
        assert!(!Snapshot::derive_user_active(None, 30.0));
        assert!(Snapshot::derive_user_active(Some(3.0), 30.0));
        assert!(!Snapshot::derive_user_active(Some(30.0), 30.0));
    }
}
