use crate::{
    append::AppendRowLayout,
    client::{
        SheetApi,
        SheetResult,
    },
    mapping,
    rest::RestSheet,
    transposed::TransposedLayout,
};
use chrono::{
    DateTime,
    Utc,
};
use deskfleet_config::{
    LayoutMode,
    SheetConfig,
};
use deskfleet_model::Snapshot;

/// Ties a configured layout to the snapshot metric mapping. This is what
/// the hub's sync task drives: reconcile once, then one `sync` call per
/// ingested snapshot.
pub enum SnapshotSync {
    Transposed {
        layout: TransposedLayout,
        watch_app: Option<String>,
    },
    Append {
        layout: AppendRowLayout,
        watch_app: Option<String>,
    },
}

impl SnapshotSync {
    pub fn from_config(config: &SheetConfig) -> SheetResult<Self> {
        let api = RestSheet::new(config.endpoint.clone())?;
        Ok(Self::with_api(Box::new(api), config.layout, config.watch_app.clone()))
    }

    pub fn with_api(api: Box<dyn SheetApi>, layout: LayoutMode, watch_app: Option<String>) -> Self {
        match layout {
            LayoutMode::Transposed => Self::Transposed {
                layout: TransposedLayout::new(api, mapping::snapshot_metric_labels(watch_app.as_deref())),
                watch_app,
            },
            LayoutMode::AppendRow => Self::Append {
                layout: AppendRowLayout::new(api, mapping::append_headers(watch_app.as_deref())),
                watch_app,
            },
        }
    }

    /// Cold-start recovery against whatever the external sheet holds. Must
    /// succeed before any [`sync`] call is accepted.
    ///
    /// [`sync`]: SnapshotSync::sync
    pub async fn reconcile(&mut self) -> SheetResult<()> {
        match self {
            Self::Transposed { layout, .. } => layout.reconcile().await,
            Self::Append { layout, .. } => layout.reconcile().await,
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Self::Transposed { layout, .. } => layout.is_ready(),
            Self::Append { layout, .. } => layout.is_ready(),
        }
    }

    pub async fn sync(&mut self, snapshot: &Snapshot, received_at: DateTime<Utc>) -> SheetResult<()> {
        match self {
            Self::Transposed { layout, watch_app } => {
                let cells = mapping::snapshot_metric_cells(snapshot, received_at, watch_app.as_deref());
                layout.sync(&snapshot.host, &cells).await
            }
            Self::Append { layout, watch_app } => {
                let cells = mapping::append_row_cells(snapshot, received_at, watch_app.as_deref());
                layout.append(cells).await
            }
        }
    }
}
