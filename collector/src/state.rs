use deskfleet_model::ComputerState;
use std::collections::BTreeMap;

/// The in-memory fleet table: latest poll results per host, sorted by host
/// identity for deterministic export.
///
/// Each host's data is independently eventually-consistent: a successful
/// discovery overwrites the table wholesale, and hosts the directory no
/// longer lists are dropped with it. A skipped cycle (failed or empty
/// discovery) leaves everything untouched.
#[derive(Debug, Default)]
pub struct FleetState {
    hosts: BTreeMap<String, ComputerState>,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_cycle(&mut self, states: Vec<ComputerState>) {
        self.hosts = states
            .into_iter()
            .map(|state| (state.host.clone(), state))
            .collect();
    }

    pub fn get(&self, host: &str) -> Option<&ComputerState> {
        self.hosts.get(host)
    }

    /// All states, ordered by host identity.
    pub fn states(&self) -> impl Iterator<Item = &ComputerState> {
        self.hosts.values()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskfleet_model::HostStatus;
    use pretty_assertions::assert_eq;

    fn state(host: &str) -> ComputerState {
        ComputerState::from_queries(host, Some(Vec::new()), Some(1.0), Some(0.1), Some(0.5))
    }

    #[test]
    fn a_cycle_overwrites_and_drops() {
        let mut fleet = FleetState::new();
        fleet.replace_cycle(vec![state("m1"), state("m2")]);
        assert_eq!(fleet.len(), 2);

        // The next successful discovery no longer lists m2.
        fleet.replace_cycle(vec![state("m1"), state("m3")]);
        assert!(fleet.get("m2").is_none());
        assert!(fleet.get("m3").is_some());
    }

    #[test]
    fn iteration_is_sorted_by_host() {
        let mut fleet = FleetState::new();
        fleet.replace_cycle(vec![state("m9"), state("m1"), state("m5")]);
        let hosts: Vec<&str> = fleet.states().map(|s| s.host.as_str()).collect();
        assert_eq!(hosts, vec!["m1", "m5", "m9"]);
    }

    #[test]
    fn classification_survives_the_table() {
        let mut fleet = FleetState::new();
        fleet.replace_cycle(vec![ComputerState::from_queries(
            "m2",
            None,
            Some(1.0),
            None,
            None,
        )]);
        assert_eq!(fleet.get("m2").unwrap().status, HostStatus::Failure);
    }
}
