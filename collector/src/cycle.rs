use crate::{
    discovery::HostDiscovery,
    display,
    export::FleetExport,
    queries::probe_host,
    remote::RemoteExec,
    state::FleetState,
};
use deskfleet_model::ComputerState;
use futures::{
    stream,
    StreamExt,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};

/// Runs the pull-based collection cycle end to end on a fixed interval.
pub struct Collector {
    discovery: Box<dyn HostDiscovery>,
    exec: Arc<dyn RemoteExec>,
    state: FleetState,
    export: Option<FleetExport>,
    parallelism: usize,
    print_table: bool,
}

impl Collector {
    pub fn new(
        discovery: Box<dyn HostDiscovery>,
        exec: Arc<dyn RemoteExec>,
        export: Option<FleetExport>,
        parallelism: usize,
        print_table: bool,
    ) -> Self {
        Self {
            discovery,
            exec,
            state: FleetState::new(),
            export,
            parallelism: parallelism.max(1),
            print_table,
        }
    }

    pub fn state(&self) -> &FleetState {
        &self.state
    }

    /// The collection loop. Cycles are not cancellable mid-host, but the
    /// loop stops between cycles as soon as `cancel` fires.
    pub async fn run(&mut self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                _ = cancel.cancelled() => {
                    info!("collector loop stopping");
                    return;
                }
            }
        }
    }

    /// One collection cycle: discovery, bounded-parallel per-host probing,
    /// state overwrite, export.
    pub async fn run_cycle(&mut self) {
        let hosts = match self.discovery.list_hosts().await {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!(error = %e, "host discovery failed, keeping previous state");
                return;
            }
        };

        // An empty directory answer is a transient misconfiguration, not an
        // empty fleet: skip the cycle wholesale.
        if hosts.is_empty() {
            warn!("discovery returned no hosts, skipping cycle");
            return;
        }

        info!(hosts = hosts.len(), "collection cycle started");

        let exec = self.exec.clone();
        let states: Vec<ComputerState> = stream::iter(hosts)
            .map(|host| {
                let exec = exec.clone();
                async move { probe_host(exec.as_ref(), &host).await }
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        self.state.replace_cycle(states);
        info!(hosts = self.state.len(), "collection cycle finished");

        if self.print_table {
            println!("{}", display::render(&self.state));
        }

        if let Some(export) = &mut self.export {
            if let Err(e) = export.write(&self.state).await {
                warn!(error = %e, "fleet export failed, continuing without the sink");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskfleet_model::HostStatus;
    use eyre::{
        eyre,
        Result,
    };
    use futures::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use std::{
        collections::HashMap,
        sync::Mutex,
    };

    /// Scripted directory answers, one per cycle.
    struct ScriptedDiscovery {
        answers: Mutex<Vec<Result<Vec<String>>>>,
    }

    impl ScriptedDiscovery {
        fn new(answers: Vec<Result<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                answers: Mutex::new(answers),
            })
        }
    }

    impl HostDiscovery for ScriptedDiscovery {
        fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<String>>> {
            Box::pin(async move {
                let mut answers = self.answers.lock().expect("answers lock");
                if answers.is_empty() {
                    Ok(Vec::new())
                } else {
                    answers.remove(0)
                }
            })
        }
    }

    /// Fake remote channel; hosts listed in `dead` fail their process-list
    /// query, hosts in `quiet` fail everything but the process list.
    struct FakeExec {
        dead: Vec<String>,
        quiet: Vec<String>,
    }

    impl FakeExec {
        fn new(dead: &[&str], quiet: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                dead: dead.iter().map(|s| s.to_string()).collect(),
                quiet: quiet.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    impl RemoteExec for FakeExec {
        fn execute<'a>(&'a self, host: &'a str, command: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move {
                let is_process_list = command.starts_with("ps");
                if is_process_list {
                    if self.dead.contains(&host.to_string()) {
                        return Err(eyre!("unreachable"));
                    }
                    return Ok("  10 init S\n  20 sshd S".to_string());
                }
                if self.dead.contains(&host.to_string()) || self.quiet.contains(&host.to_string()) {
                    return Err(eyre!("probe unavailable"));
                }
                Ok("1200".to_string())
            })
        }
    }

    fn counts(state: &FleetState) -> HashMap<HostStatus, usize> {
        let mut counts = HashMap::new();
        for s in state.states() {
            *counts.entry(s.status).or_insert(0) += 1;
        }
        counts
    }

    #[tokio::test]
    async fn process_list_failure_marks_the_host_unreachable() {
        let discovery = ScriptedDiscovery::new(vec![Ok(vec!["m1".to_string(), "m2".to_string()])]);
        let exec = FakeExec::new(&["m2"], &[]);
        let mut collector = Collector::new(discovery, exec, None, 2, false);

        collector.run_cycle().await;

        let state = collector.state();
        assert_eq!(state.get("m1").unwrap().status, HostStatus::Ok);
        assert_eq!(state.get("m2").unwrap().status, HostStatus::Failure);
    }

    #[tokio::test]
    async fn secondary_probe_failures_are_partial() {
        let discovery = ScriptedDiscovery::new(vec![Ok(vec!["m1".to_string()])]);
        let exec = FakeExec::new(&[], &["m1"]);
        let mut collector = Collector::new(discovery, exec, None, 2, false);

        collector.run_cycle().await;

        let m1 = collector.state().get("m1").unwrap();
        assert_eq!(m1.status, HostStatus::Partial);
        assert_eq!(m1.process_count(), Some(2));
        assert!(m1.observations.contains("idle time"));
    }

    #[tokio::test]
    async fn empty_discovery_keeps_the_previous_state() {
        let discovery = ScriptedDiscovery::new(vec![
            Ok(vec!["m1".to_string()]),
            Ok(Vec::new()),
            Err(eyre!("directory unreachable")),
        ]);
        let exec = FakeExec::new(&[], &[]);
        let mut collector = Collector::new(discovery, exec, None, 2, false);

        collector.run_cycle().await;
        assert_eq!(collector.state().len(), 1);

        // Empty answer: skipped, nothing wiped.
        collector.run_cycle().await;
        assert_eq!(collector.state().len(), 1);

        // Failed discovery: same.
        collector.run_cycle().await;
        assert!(collector.state().get("m1").is_some());
    }

    #[tokio::test]
    async fn a_successful_discovery_that_omits_a_host_drops_it() {
        let discovery = ScriptedDiscovery::new(vec![
            Ok(vec!["m1".to_string(), "m2".to_string()]),
            Ok(vec!["m1".to_string()]),
        ]);
        let exec = FakeExec::new(&[], &[]);
        let mut collector = Collector::new(discovery, exec, None, 2, false);

        collector.run_cycle().await;
        assert_eq!(collector.state().len(), 2);

        collector.run_cycle().await;
        assert!(collector.state().get("m2").is_none());
        assert_eq!(counts(collector.state())[&HostStatus::Ok], 1);
    }
}
