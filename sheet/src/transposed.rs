use crate::{
    allocator::ColumnAllocator,
    client::{
        cell_ref,
        range_ref,
        SheetApi,
        SheetResult,
    },
    mapping::METRIC_LABEL,
};

/// Hosts start in column B; column A is reserved for the metric labels.
pub const FIRST_HOST_COLUMN: u32 = 2;

/// One column per host, one fixed metric per row.
///
/// Row 1 holds host identities, column A holds the metric labels with the
/// reserved [`METRIC_LABEL`] in A1. Writes always target a single host's
/// column; other columns are never touched after they are written.
pub struct TransposedLayout {
    api: Box<dyn SheetApi>,
    allocator: ColumnAllocator,
    metric_labels: Vec<String>,
    ready: bool,
}

impl TransposedLayout {
    pub fn new(api: Box<dyn SheetApi>, metric_labels: Vec<String>) -> Self {
        Self {
            api,
            allocator: ColumnAllocator::new(FIRST_HOST_COLUMN),
            metric_labels,
            ready: false,
        }
    }

    /// One-time cold-start reconciliation, required before [`sync`].
    ///
    /// A sheet that does not carry the reserved label in A1 is not ours: it
    /// is cleared and reinitialized with the fixed label column. Otherwise
    /// the hosts already present in row 1 are adopted so a process restart
    /// keeps every column where it was.
    ///
    /// [`sync`]: TransposedLayout::sync
    pub async fn reconcile(&mut self) -> SheetResult<()> {
        let header = self.api.read_row(1).await?;

        if header.first().map(String::as_str) != Some(METRIC_LABEL) {
            info!("sheet is uninitialized or foreign, resetting to the metric layout");
            self.api.clear().await?;
            let mut label_column = vec![vec![METRIC_LABEL.to_string()]];
            label_column.extend(self.metric_labels.iter().map(|label| vec![label.clone()]));
            let range = range_ref(1, 1, 1, label_column.len() as u32);
            self.api.write_range(range, label_column).await?;
        } else {
            for (index, host) in header.iter().enumerate().skip(1) {
                if !host.is_empty() {
                    self.allocator.adopt(host, index as u32 + 1);
                }
            }
            debug!(hosts = self.allocator.len(), "adopted host columns from the sheet header");
        }

        self.ready = true;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn column_of(&self, host: &str) -> Option<u32> {
        self.allocator.get(host)
    }

    /// Writes `values` (one per metric label, in label order) into the
    /// host's column, assigning the next free column on first sight.
    pub async fn sync(&mut self, host: &str, values: &[String]) -> SheetResult<()> {
        debug_assert_eq!(values.len(), self.metric_labels.len());

        let (column, newly_assigned) = self.allocator.assign(host);
        if newly_assigned {
            debug!(host, column, "allocating sheet column");
            self.api
                .write_range(
                    format!("{0}:{0}", cell_ref(column, 1)),
                    vec![vec![host.to_string()]],
                )
                .await?;
        }

        let rows: Vec<Vec<String>> = values.iter().map(|value| vec![value.clone()]).collect();
        let range = range_ref(column, 2, column, values.len() as u32 + 1);
        self.api.write_range(range, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use pretty_assertions::assert_eq;

    fn labels() -> Vec<String> {
        vec!["Timestamp".to_string(), "User active".to_string()]
    }

    fn values(ts: &str, active: &str) -> Vec<String> {
        vec![ts.to_string(), active.to_string()]
    }

    #[tokio::test]
    async fn foreign_sheet_is_reset_to_the_metric_layout() {
        let sheet = MemorySheet::new();
        sheet.seed(vec![vec!["Quarterly numbers".to_string()]]);

        let mut layout = TransposedLayout::new(Box::new(sheet.clone()), labels());
        layout.reconcile().await.unwrap();

        assert_eq!(sheet.cell(1, 1).as_deref(), Some("Metric"));
        assert_eq!(sheet.cell(1, 2).as_deref(), Some("Timestamp"));
        assert_eq!(sheet.cell(1, 3).as_deref(), Some("User active"));
    }

    #[tokio::test]
    async fn restart_adopts_existing_columns() {
        let sheet = MemorySheet::new();
        sheet.seed(vec![vec![
            "Metric".to_string(),
            "pc-a".to_string(),
            "pc-b".to_string(),
        ]]);

        let mut layout = TransposedLayout::new(Box::new(sheet.clone()), labels());
        layout.reconcile().await.unwrap();

        assert_eq!(layout.column_of("pc-a"), Some(2));
        assert_eq!(layout.column_of("pc-b"), Some(3));

        // A host new after the restart lands past the adopted ones.
        layout.sync("pc-c", &values("t", "true")).await.unwrap();
        assert_eq!(layout.column_of("pc-c"), Some(4));
        assert_eq!(sheet.cell(4, 1).as_deref(), Some("pc-c"));
    }

    #[tokio::test]
    async fn syncing_one_host_never_disturbs_the_others() {
        let sheet = MemorySheet::new();
        let mut layout = TransposedLayout::new(Box::new(sheet.clone()), labels());
        layout.reconcile().await.unwrap();

        layout.sync("pc-a", &values("t1", "true")).await.unwrap();
        layout.sync("pc-b", &values("t2", "false")).await.unwrap();
        layout.sync("pc-c", &values("t3", "true")).await.unwrap();

        let columns = (
            layout.column_of("pc-a").unwrap(),
            layout.column_of("pc-b").unwrap(),
            layout.column_of("pc-c").unwrap(),
        );
        assert_eq!(columns, (2, 3, 4));

        // Re-sync the first host with fresh values.
        layout.sync("pc-a", &values("t9", "false")).await.unwrap();

        assert_eq!(layout.column_of("pc-b"), Some(3));
        assert_eq!(layout.column_of("pc-c"), Some(4));
        assert_eq!(sheet.cell(2, 2).as_deref(), Some("t9"));
        assert_eq!(sheet.cell(3, 2).as_deref(), Some("t2"));
        assert_eq!(sheet.cell(4, 2).as_deref(), Some("t3"));
    }

    #[tokio::test]
    async fn sync_surfaces_outages_without_corrupting_state() {
        let sheet = MemorySheet::new();
        let mut layout = TransposedLayout::new(Box::new(sheet.clone()), labels());
        layout.reconcile().await.unwrap();
        layout.sync("pc-a", &values("t1", "true")).await.unwrap();

        sheet.set_failing(true);
        assert!(layout.sync("pc-a", &values("t2", "true")).await.is_err());

        sheet.set_failing(false);
        layout.sync("pc-a", &values("t3", "true")).await.unwrap();
        assert_eq!(sheet.cell(2, 2).as_deref(), Some("t3"));
    }
}
