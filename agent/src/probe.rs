use deskfleet_model::{
    ProcessInfo,
    Snapshot,
};
use sysinfo::{
    ProcessesToUpdate,
    System,
};
use tokio::process::Command;
use tracing::debug;

/// Local telemetry probes. The process inventory comes from the system
/// tables; idle time and the foreground window are best-effort external
/// probes that yield `None` wherever they are unsupported.
pub struct Prober {
    system: System,
    process_limit: usize,
    idle_threshold: f64,
    watch_app: Option<String>,
}

impl Prober {
    pub fn new(process_limit: usize, idle_threshold: f64, watch_app: Option<String>) -> Self {
        Self {
            system: System::new(),
            process_limit,
            idle_threshold,
            watch_app,
        }
    }

    pub async fn snapshot(&mut self, host: &str) -> Snapshot {
        let processes = self.list_processes();
        let idle_seconds = idle_seconds().await;
        let foreground_process = foreground_process().await;
        let user_active = Snapshot::derive_user_active(idle_seconds, self.idle_threshold);

        let mut snapshot = Snapshot::new(host);
        snapshot.idle_seconds = idle_seconds;
        snapshot.user_active = user_active;
        snapshot.foreground_process = foreground_process.clone();
        snapshot.processes = processes;

        if let Some(app) = &self.watch_app {
            let needle = app.to_lowercase();
            let running = snapshot
                .processes
                .iter()
                .any(|process| process.name.to_lowercase().contains(&needle));
            let in_focus = foreground_process
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false);

            snapshot.extensions.insert(format!("{app}_running"), running);
            snapshot.extensions.insert(format!("{app}_in_focus"), in_focus);
            snapshot
                .extensions
                .insert(format!("{app}_user_active"), running && user_active);
        }

        snapshot
    }

    fn list_processes(&mut self) -> Vec<ProcessInfo> {
        self.system.refresh_processes(ProcessesToUpdate::All);

        let mut processes: Vec<ProcessInfo> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32() as i32,
                name: process.name().to_string_lossy().to_string(),
                status: process.status().to_string(),
            })
            .collect();

        processes.sort_by_key(|process| process.pid);
        processes.truncate(self.process_limit);
        processes
    }
}

/// Seconds since the last input event, via `xprintidle` (milliseconds).
/// `None` wherever the probe is missing or fails.
async fn idle_seconds() -> Option<f64> {
    let output = Command::new("xprintidle").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    let millis: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
    Some(millis / 1000.0)
}

/// Name of the focused window's process, best effort.
async fn foreground_process() -> Option<String> {
    let output = Command::new("xdotool")
        .args(["getactivewindow", "getwindowname"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        debug!("foreground probe unavailable");
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
