use chrono::{
    DateTime,
    Utc,
};
use deskfleet_model::{
    Snapshot,
    SummaryView,
};
use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    sync::Arc,
};

/// Transport-level identity of one agent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binds a connection to a logical host identity plus the latest snapshot
/// received over it.
#[derive(Debug, Clone)]
pub struct Session {
    pub host: String,
    pub last: Option<Arc<Snapshot>>,
    pub received_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(host: String) -> Self {
        Self {
            host,
            last: None,
            received_at: None,
        }
    }
}

/// Authoritative mapping between transport connections and host identities.
///
/// A re-registration of an already-claimed host identity supersedes the old
/// connection: the old session is orphaned, not closed, and its eventual
/// disconnect must not evict the new one. Every removal therefore compares
/// connection ids, never host identities alone.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Session>,
    by_host: HashMap<String, ConnectionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces the session for `connection`, superseding any
    /// other connection currently claiming `host`. Returns the updated
    /// host list for broadcasting.
    pub fn register(&mut self, connection: ConnectionId, host: String) -> Vec<String> {
        if let Some(previous) = self.by_host.insert(host.clone(), connection) {
            if previous != connection {
                info!(%host, old = %previous, new = %connection, "host re-registered, superseding previous connection");
            }
        }
        self.sessions.insert(connection, Session::new(host));
        self.hosts()
    }

    /// Stores the snapshot on the connection's session. A snapshot for an
    /// unknown or already-disconnected connection is dropped.
    pub fn ingest(
        &mut self,
        connection: ConnectionId,
        snapshot: Arc<Snapshot>,
        received_at: DateTime<Utc>,
    ) -> bool {
        match self.sessions.get_mut(&connection) {
            Some(session) => {
                session.last = Some(snapshot);
                session.received_at = Some(received_at);
                true
            }
            None => {
                debug!(connection = %connection, "dropping snapshot for unknown connection");
                false
            }
        }
    }

    /// Removes the connection's session, if it still exists. Returns the
    /// updated host list when something was removed, `None` on a repeat
    /// call so the caller does not re-broadcast.
    pub fn unregister(&mut self, connection: ConnectionId) -> Option<Vec<String>> {
        let session = self.sessions.remove(&connection)?;
        // Only drop the reverse mapping if it still points at us; an
        // orphaned session must not evict its successor.
        if self.by_host.get(&session.host) == Some(&connection) {
            self.by_host.remove(&session.host);
        }
        Some(self.hosts())
    }

    /// All currently registered host identities, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.by_host.keys().cloned().collect();
        hosts.sort();
        hosts
    }

    /// Per-host projection of the latest snapshots. Pure read.
    pub fn summarize(&self) -> BTreeMap<String, SummaryView> {
        self.by_host
            .iter()
            .filter_map(|(host, connection)| {
                let session = self.sessions.get(connection)?;
                let view = SummaryView::from_snapshot(session.last.as_deref(), session.received_at);
                Some((host.clone(), view))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(host: &str, idle: f64, processes: usize) -> Arc<Snapshot> {
        let mut snapshot = Snapshot::new(host);
        snapshot.idle_seconds = Some(idle);
        snapshot.user_active = idle < 30.0;
        snapshot.processes = (0..processes)
            .map(|pid| deskfleet_model::ProcessInfo {
                pid: pid as i32,
                name: format!("proc-{pid}"),
                status: "running".to_string(),
            })
            .collect();
        Arc::new(snapshot)
    }

    #[test]
    fn register_snapshot_disconnect_leaves_no_trace() {
        let mut registry = SessionRegistry::new();
        let conn = ConnectionId(1);

        registry.register(conn, "pc-01".to_string());
        assert!(registry.ingest(conn, snapshot("pc-01", 5.0, 3), Utc::now()));
        assert!(registry.unregister(conn).is_some());

        assert!(registry.summarize().is_empty());
        assert!(registry.hosts().is_empty());
    }

    #[test]
    fn summary_reflects_the_latest_snapshot() {
        let mut registry = SessionRegistry::new();
        let conn = ConnectionId(1);
        registry.register(conn, "pc-01".to_string());
        registry.ingest(conn, snapshot("pc-01", 5.0, 4), Utc::now());

        let summary = registry.summarize();
        let view = &summary["pc-01"];
        assert_eq!(view.user_active, Some(true));
        assert_eq!(view.process_count, Some(4));
        assert_eq!(view.idle_seconds, Some(5.0));
    }

    #[test]
    fn silent_host_appears_with_null_fields() {
        let mut registry = SessionRegistry::new();
        registry.register(ConnectionId(1), "pc-01".to_string());

        let summary = registry.summarize();
        assert!(summary["pc-01"].ts.is_none());
        assert!(summary["pc-01"].user_active.is_none());
    }

    #[test]
    fn orphaned_disconnect_does_not_evict_the_successor() {
        let mut registry = SessionRegistry::new();
        let old = ConnectionId(1);
        let new = ConnectionId(2);

        registry.register(old, "pc-01".to_string());
        registry.register(new, "pc-01".to_string());
        registry.ingest(new, snapshot("pc-01", 2.0, 1), Utc::now());

        // The superseded connection finally notices and disconnects.
        registry.unregister(old);

        let summary = registry.summarize();
        assert_eq!(summary["pc-01"].process_count, Some(1));
        assert_eq!(registry.hosts(), vec!["pc-01".to_string()]);
    }

    #[test]
    fn snapshot_for_unknown_connection_is_dropped() {
        let mut registry = SessionRegistry::new();
        assert!(!registry.ingest(ConnectionId(9), snapshot("ghost", 1.0, 1), Utc::now()));
        assert!(registry.summarize().is_empty());
    }

    #[test]
    fn unregister_twice_is_a_noop_the_second_time() {
        let mut registry = SessionRegistry::new();
        let conn = ConnectionId(1);
        registry.register(conn, "pc-01".to_string());

        assert!(registry.unregister(conn).is_some());
        assert!(registry.unregister(conn).is_none());
    }

    #[test]
    fn host_list_is_sorted() {
        let mut registry = SessionRegistry::new();
        registry.register(ConnectionId(1), "pc-z".to_string());
        let hosts = registry.register(ConnectionId(2), "pc-a".to_string());
        assert_eq!(hosts, vec!["pc-a".to_string(), "pc-z".to_string()]);
    }
}
