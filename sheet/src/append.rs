use crate::client::{
    SheetApi,
    SheetResult,
};

/// One appended row per reading, unordered by host.
///
/// The header row is written once, only when the sheet is empty; afterwards
/// the layout is strictly append-only.
pub struct AppendRowLayout {
    api: Box<dyn SheetApi>,
    headers: Vec<String>,
    ready: bool,
}

impl AppendRowLayout {
    pub fn new(api: Box<dyn SheetApi>, headers: Vec<String>) -> Self {
        Self {
            api,
            headers,
            ready: false,
        }
    }

    pub async fn reconcile(&mut self) -> SheetResult<()> {
        let first = self.api.read_row(1).await?;
        if first.is_empty() {
            self.api.append_row(self.headers.clone()).await?;
        } else if first != self.headers {
            // Keep appending anyway; a header drift must not eat the data.
            warn!(?first, "sheet header does not match the configured columns");
        }
        self.ready = true;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub async fn append(&mut self, cells: Vec<String>) -> SheetResult<()> {
        self.api.append_row(cells).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use pretty_assertions::assert_eq;

    fn headers() -> Vec<String> {
        vec!["timestamp".to_string(), "host".to_string()]
    }

    #[tokio::test]
    async fn header_is_written_exactly_once() {
        let sheet = MemorySheet::new();

        let mut layout = AppendRowLayout::new(Box::new(sheet.clone()), headers());
        layout.reconcile().await.unwrap();
        assert_eq!(sheet.row_count(), 1);

        // A second process start must not add another header.
        let mut layout = AppendRowLayout::new(Box::new(sheet.clone()), headers());
        layout.reconcile().await.unwrap();
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.cell(1, 1).as_deref(), Some("timestamp"));
    }

    #[tokio::test]
    async fn rows_accumulate_in_arrival_order() {
        let sheet = MemorySheet::new();
        let mut layout = AppendRowLayout::new(Box::new(sheet.clone()), headers());
        layout.reconcile().await.unwrap();

        layout
            .append(vec!["t1".to_string(), "pc-b".to_string()])
            .await
            .unwrap();
        layout
            .append(vec!["t2".to_string(), "pc-a".to_string()])
            .await
            .unwrap();

        assert_eq!(sheet.cell(2, 2).as_deref(), Some("pc-b"));
        assert_eq!(sheet.cell(2, 3).as_deref(), Some("pc-a"));
    }
}
