use crate::state::FleetState;
use chrono::SecondsFormat;
use deskfleet_config::ExportMode;
use deskfleet_model::ComputerState;
use deskfleet_sheet::{
    client::range_ref,
    RestSheet,
    SheetApi,
    SheetResult,
    TransposedLayout,
};
use tracing::debug;
use url::Url;

/// Full-table export of the fleet state, written once per collection cycle.
pub enum FleetExport {
    /// One column per host through the shared column allocator; previously
    /// written columns keep their place across restarts.
    Transposed(TransposedLayout),
    /// Clear-and-rewrite of the whole table as rows.
    Rewrite { api: Box<dyn SheetApi> },
}

/// Row labels for the transposed export, in their fixed order.
pub fn fleet_metric_labels() -> Vec<String> {
    [
        "Timestamp",
        "Status",
        "Observations",
        "Idle seconds",
        "CPU load",
        "Memory load",
        "Process count",
    ]
    .map(String::from)
    .to_vec()
}

pub fn fleet_metric_cells(state: &ComputerState) -> Vec<String> {
    vec![
        state.polled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        state.status.to_string(),
        state.observations.clone(),
        opt_num(state.idle_seconds),
        opt_num(state.cpu_load),
        opt_num(state.memory_load),
        state
            .process_count()
            .map(|count| count.to_string())
            .unwrap_or_default(),
    ]
}

fn fleet_row_headers() -> Vec<String> {
    [
        "host",
        "timestamp",
        "status",
        "observations",
        "idle_seconds",
        "cpu_load",
        "memory_load",
        "process_count",
    ]
    .map(String::from)
    .to_vec()
}

fn fleet_row_cells(state: &ComputerState) -> Vec<String> {
    let mut cells = vec![state.host.clone()];
    cells.extend(fleet_metric_cells(state));
    cells
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl FleetExport {
    pub fn from_endpoint(endpoint: Url, mode: ExportMode) -> SheetResult<Self> {
        let api = RestSheet::new(endpoint)?;
        Ok(match mode {
            ExportMode::Transposed => {
                Self::Transposed(TransposedLayout::new(Box::new(api), fleet_metric_labels()))
            }
            ExportMode::Rewrite => Self::Rewrite { api: Box::new(api) },
        })
    }

    pub fn with_api(api: Box<dyn SheetApi>, mode: ExportMode) -> Self {
        match mode {
            ExportMode::Transposed => Self::Transposed(TransposedLayout::new(api, fleet_metric_labels())),
            ExportMode::Rewrite => Self::Rewrite { api },
        }
    }

    /// Writes the whole fleet table, hosts in sorted order. A transposed
    /// sheet that has not been reconciled yet (first cycle, or every cycle
    /// while the sink is down) is reconciled first.
    pub async fn write(&mut self, fleet: &FleetState) -> SheetResult<()> {
        match self {
            Self::Transposed(layout) => {
                if !layout.is_ready() {
                    layout.reconcile().await?;
                }
                for state in fleet.states() {
                    layout.sync(&state.host, &fleet_metric_cells(state)).await?;
                }
            }
            Self::Rewrite { api } => {
                let mut rows = vec![fleet_row_headers()];
                rows.extend(fleet.states().map(fleet_row_cells));
                let width = rows[0].len() as u32;
                let height = rows.len() as u32;
                api.clear().await?;
                api.write_range(range_ref(1, 1, width, height), rows).await?;
            }
        }
        debug!(hosts = fleet.len(), "fleet table exported");
        Ok(())
    }
}
