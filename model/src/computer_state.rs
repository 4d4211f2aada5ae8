use crate::snapshot::ProcessInfo;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;

/// Health classification of one polled host.
///
/// The process-list query doubles as the reachability signal: when it fails
/// the host is treated as entirely unreachable, regardless of the other
/// three queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum HostStatus {
    #[strum(serialize = "OK")]
    #[serde(rename = "OK")]
    Ok,
    Partial,
    Failure,
}

/// The latest values from the four independent remote queries for one host.
///
/// Overwritten wholesale every collection cycle; each field is nullable on
/// its own so a failed probe never hides the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputerState {
    pub host: String,
    pub polled_at: DateTime<Utc>,
    pub processes: Option<Vec<ProcessInfo>>,
    pub idle_seconds: Option<f64>,
    pub cpu_load: Option<f64>,
    pub memory_load: Option<f64>,
    pub status: HostStatus,
    pub observations: String,
}

impl ComputerState {
    pub fn from_queries(
        host: impl Into<String>,
        processes: Option<Vec<ProcessInfo>>,
        idle_seconds: Option<f64>,
        cpu_load: Option<f64>,
        memory_load: Option<f64>,
    ) -> Self {
        let mut missing = Vec::new();
        if processes.is_none() {
            missing.push("process list");
        }
        if idle_seconds.is_none() {
            missing.push("idle time");
        }
        if cpu_load.is_none() {
            missing.push("cpu load");
        }
        if memory_load.is_none() {
            missing.push("memory load");
        }

        let status = if processes.is_none() {
            HostStatus::Failure
        } else if !missing.is_empty() {
            HostStatus::Partial
        } else {
            HostStatus::Ok
        };

        let observations = if missing.is_empty() {
            String::new()
        } else {
            format!("{} unavailable", missing.join(", "))
        };

        Self {
            host: host.into(),
            polled_at: Utc::now(),
            processes,
            idle_seconds,
            cpu_load,
            memory_load,
            status,
            observations,
        }
    }

    pub fn process_count(&self) -> Option<usize> {
        self.processes.as_ref().map(Vec::len)
    }
}
