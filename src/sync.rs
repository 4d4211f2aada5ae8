use crate::hub::SyncItem;
use deskfleet_config::SheetConfig;
use deskfleet_sheet::SnapshotSync;
use tokio::sync::mpsc;

const QUEUE_CAPACITY: usize = 256;

/// Spawns the sheet-sync task and returns its queue.
///
/// The task reconciles the external sheet once, then drains snapshots for
/// the lifetime of the process. Any sink failure (at reconciliation or per
/// write) is logged and the affected snapshots are skipped; the hub keeps
/// serving registry and history either way.
pub fn spawn(config: SheetConfig) -> mpsc::Sender<SyncItem> {
    let (tx, mut rx) = mpsc::channel::<SyncItem>(QUEUE_CAPACITY);

    tokio::spawn(async move {
        let mut sync = match SnapshotSync::from_config(&config) {
            Ok(sync) => sync,
            Err(e) => {
                error!(error = %e, "sheet sink misconfigured, export disabled");
                while rx.recv().await.is_some() {}
                return;
            }
        };

        if let Err(e) = sync.reconcile().await {
            error!(error = %e, "sheet reconciliation failed, export disabled");
            // Keep draining so ingestion never sees a closed queue.
            while rx.recv().await.is_some() {}
            return;
        }
        info!(endpoint = %config.endpoint, layout = %config.layout, "sheet export ready");

        while let Some((snapshot, received_at)) = rx.recv().await {
            if let Err(e) = sync.sync(&snapshot, received_at).await {
                warn!(host = %snapshot.host, error = %e, "sheet sync failed, snapshot skipped");
            }
        }
    });

    tx
}
