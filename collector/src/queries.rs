use crate::remote::RemoteExec;
use deskfleet_model::{
    ComputerState,
    ProcessInfo,
};
use tracing::warn;

/// The four read-only diagnostic queries run against every host each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteQuery {
    ProcessList,
    IdleSeconds,
    CpuLoad,
    MemoryLoad,
}

impl RemoteQuery {
    pub fn label(&self) -> &'static str {
        match self {
            RemoteQuery::ProcessList => "process list",
            RemoteQuery::IdleSeconds => "idle time",
            RemoteQuery::CpuLoad => "cpu load",
            RemoteQuery::MemoryLoad => "memory load",
        }
    }

    /// The command payload handed to the remote-execution channel.
    pub fn command(&self) -> &'static str {
        match self {
            RemoteQuery::ProcessList => "ps -eo pid=,comm=,stat=",
            RemoteQuery::IdleSeconds => "xprintidle",
            RemoteQuery::CpuLoad => "cut -d' ' -f1 /proc/loadavg",
            RemoteQuery::MemoryLoad => "free | awk '/Mem:/ {printf \"%.4f\", $3/$2}'",
        }
    }
}

/// Runs all four queries against `host` and folds the results into one
/// [`ComputerState`]. The queries run concurrently but the state is only
/// built once every one of them has settled, so a half-updated host is
/// never published.
pub async fn probe_host(exec: &dyn RemoteExec, host: &str) -> ComputerState {
    let (processes, idle, cpu, memory) = tokio::join!(
        run(exec, host, RemoteQuery::ProcessList),
        run(exec, host, RemoteQuery::IdleSeconds),
        run(exec, host, RemoteQuery::CpuLoad),
        run(exec, host, RemoteQuery::MemoryLoad),
    );

    let processes = processes.and_then(|text| parse_processes(host, &text));
    let idle = idle.and_then(|text| parse_idle_seconds(host, &text));
    let cpu = cpu.and_then(|text| parse_scalar(host, RemoteQuery::CpuLoad, &text));
    let memory = memory.and_then(|text| parse_scalar(host, RemoteQuery::MemoryLoad, &text));

    ComputerState::from_queries(host, processes, idle, cpu, memory)
}

async fn run(exec: &dyn RemoteExec, host: &str, query: RemoteQuery) -> Option<String> {
    match exec.execute(host, query.command()).await {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(%host, query = query.label(), error = %e, "remote query failed");
            None
        }
    }
}

/// Accepts either a JSON array of `{pid, name, status}` objects or the
/// plain `ps` column format the default query emits.
fn parse_processes(host: &str, text: &str) -> Option<Vec<ProcessInfo>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return match serde_json::from_str(trimmed) {
            Ok(processes) => Some(processes),
            Err(e) => {
                warn!(%host, error = %e, "unparseable process list payload");
                None
            }
        };
    }

    let processes: Vec<ProcessInfo> = trimmed
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse().ok()?;
            let name = fields.next()?.to_string();
            let status = fields.next().unwrap_or("unknown").to_string();
            Some(ProcessInfo { pid, name, status })
        })
        .collect();

    if processes.is_empty() {
        warn!(%host, "process list payload held no parseable rows");
        return None;
    }
    Some(processes)
}

/// `xprintidle` reports milliseconds.
fn parse_idle_seconds(host: &str, text: &str) -> Option<f64> {
    parse_scalar(host, RemoteQuery::IdleSeconds, text).map(|millis| millis / 1000.0)
}

fn parse_scalar(host: &str, query: RemoteQuery, text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%host, query = query.label(), error = %e, "unparseable scalar payload");
            None
        }
    }
}
