use crate::{
    history::{
        BoundedHistory,
        HistoryEntry,
    },
    registry::{
        ConnectionId,
        SessionRegistry,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use deskfleet_model::{
    Snapshot,
    SummaryView,
};
use deskfleet_sheet::mapping;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
        Mutex,
    },
};
use tokio::sync::{
    broadcast,
    mpsc,
};

/// Events re-published to every subscribed connection. At most once per
/// event; late subscribers get no replay.
#[derive(Debug, Clone)]
pub enum HubEvent {
    HostList(Vec<String>),
    Telemetry(Arc<Snapshot>),
}

/// A snapshot queued for the sheet-sync task, stamped with its receipt time.
pub type SyncItem = (Arc<Snapshot>, DateTime<Utc>);

const EVENT_CAPACITY: usize = 256;

/// The hub's shared state: session registry and bounded history behind
/// their own locks, a broadcast channel for fan-out, and a queue into the
/// sheet-sync task.
///
/// Constructed once at process start and handed by `Arc` to every
/// connection handler. Locks are held only for in-memory mutation; sheet
/// I/O runs on its own task so a slow sink can never stall ingestion.
pub struct Hub {
    registry: Mutex<SessionRegistry>,
    history: Mutex<BoundedHistory>,
    events: broadcast::Sender<HubEvent>,
    sheet_tx: Option<mpsc::Sender<SyncItem>>,
    next_connection: AtomicU64,
    watch_app: Option<String>,
}

impl Hub {
    pub fn new(history_cap: usize, watch_app: Option<String>, sheet_tx: Option<mpsc::Sender<SyncItem>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            history: Mutex::new(BoundedHistory::new(history_cap)),
            events,
            sheet_tx,
            next_connection: AtomicU64::new(1),
            watch_app,
        }
    }

    /// Mints the transport identity for a newly accepted connection.
    pub fn next_connection(&self) -> ConnectionId {
        ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    pub fn watch_app(&self) -> Option<&str> {
        self.watch_app.as_deref()
    }

    /// Registers `host` on `connection` and broadcasts the updated host
    /// list.
    pub fn register(&self, connection: ConnectionId, host: String) -> Vec<String> {
        let hosts = self
            .registry
            .lock()
            .expect("registry lock")
            .register(connection, host);
        let _ = self.events.send(HubEvent::HostList(hosts.clone()));
        hosts
    }

    /// Ingests one snapshot: registry update, history append, broadcast,
    /// and a non-blocking hand-off to the sheet-sync task.
    pub fn ingest(&self, connection: ConnectionId, snapshot: Snapshot) {
        let received_at = Utc::now();
        let snapshot = Arc::new(snapshot);

        let accepted = self
            .registry
            .lock()
            .expect("registry lock")
            .ingest(connection, snapshot.clone(), received_at);
        if !accepted {
            return;
        }

        self.history.lock().expect("history lock").append(HistoryEntry {
            snapshot: snapshot.clone(),
            received_at,
        });

        debug!(host = %snapshot.host, processes = snapshot.process_count(), "snapshot ingested");
        let _ = self.events.send(HubEvent::Telemetry(snapshot.clone()));

        if let Some(sheet_tx) = &self.sheet_tx {
            if sheet_tx.try_send((snapshot, received_at)).is_err() {
                warn!("sheet sync queue unavailable, skipping snapshot export");
            }
        }
    }

    /// Drops the connection's session and re-broadcasts the host list.
    /// Safe to call more than once; repeats are no-ops without a broadcast.
    pub fn unregister(&self, connection: ConnectionId) {
        let removed = self.registry.lock().expect("registry lock").unregister(connection);
        if let Some(hosts) = removed {
            let _ = self.events.send(HubEvent::HostList(hosts));
        }
    }

    pub fn summarize(&self) -> BTreeMap<String, SummaryView> {
        self.registry.lock().expect("registry lock").summarize()
    }

    /// The full history as header-ordered rows for the tabular export.
    pub fn export_rows(&self) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
        let entries = self.history.lock().expect("history lock").all();
        let headers = mapping::append_headers(self.watch_app());
        let rows = entries
            .iter()
            .map(|entry| mapping::append_row_json(&entry.snapshot, entry.received_at, self.watch_app()))
            .collect();
        (headers, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(host: &str) -> Snapshot {
        let mut snapshot = Snapshot::new(host);
        snapshot.idle_seconds = Some(5.0);
        snapshot.user_active = true;
        snapshot
    }

    #[tokio::test]
    async fn ingest_updates_history_and_broadcasts() {
        let hub = Hub::new(100, None, None);
        let connection = hub.next_connection();
        let mut events = hub.subscribe();

        hub.register(connection, "pc-01".to_string());
        assert!(matches!(events.recv().await.unwrap(), HubEvent::HostList(_)));

        hub.ingest(connection, snapshot("pc-01"));
        match events.recv().await.unwrap() {
            HubEvent::Telemetry(snapshot) => assert_eq!(snapshot.host, "pc-01"),
            other => panic!("unexpected event: {other:?}"),
        }

        let (headers, rows) = hub.export_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(headers[1], "host");
        assert_eq!(rows[0][1], "pc-01");
    }

    #[tokio::test]
    async fn unknown_connection_mutates_nothing() {
        let hub = Hub::new(100, None, None);
        hub.ingest(ConnectionId(42), snapshot("ghost"));

        assert!(hub.summarize().is_empty());
        let (_, rows) = hub.export_rows();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn repeated_unregister_broadcasts_once() {
        let hub = Hub::new(100, None, None);
        let connection = hub.next_connection();
        hub.register(connection, "pc-01".to_string());

        let mut events = hub.subscribe();
        hub.unregister(connection);
        hub.unregister(connection);

        assert!(matches!(events.recv().await.unwrap(), HubEvent::HostList(_)));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn ingestion_survives_a_dropped_sync_task() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let hub = Hub::new(100, None, Some(tx));
        let connection = hub.next_connection();
        hub.register(connection, "pc-01".to_string());
        hub.ingest(connection, snapshot("pc-01"));

        assert_eq!(hub.summarize()["pc-01"].user_active, Some(true));
    }
}
