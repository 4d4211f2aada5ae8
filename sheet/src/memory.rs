use crate::client::{
    parse_cell_ref,
    SheetApi,
    SheetError,
    SheetResult,
};
use futures::future::BoxFuture;
use std::sync::{
    Arc,
    Mutex,
};

/// In-memory sheet backend, used by the test suites and by dry runs where
/// no real sink is configured.
#[derive(Default, Clone)]
pub struct MemorySheet {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    // rows[row - 1][column - 1]
    rows: Vec<Vec<String>>,
    failing: bool,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail, simulating a sink outage.
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().expect("sheet lock").failing = failing;
    }

    pub fn cell(&self, column: u32, row: u32) -> Option<String> {
        let inner = self.inner.lock().expect("sheet lock");
        inner
            .rows
            .get(row as usize - 1)
            .and_then(|r| r.get(column as usize - 1))
            .filter(|cell| !cell.is_empty())
            .cloned()
    }

    pub fn row_count(&self) -> usize {
        self.inner.lock().expect("sheet lock").rows.len()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.inner.lock().expect("sheet lock").rows.clone()
    }

    /// Seeds the grid, bypassing the API. Test setup only.
    pub fn seed(&self, rows: Vec<Vec<String>>) {
        self.inner.lock().expect("sheet lock").rows = rows;
    }
}

impl Inner {
    fn ensure(&mut self, column: usize, row: usize) {
        if self.rows.len() < row {
            self.rows.resize(row, Vec::new());
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
    }

    fn check(&self) -> SheetResult<()> {
        if self.failing {
            Err(SheetError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SheetApi for MemorySheet {
    fn read_row(&self, row: u32) -> BoxFuture<'_, SheetResult<Vec<String>>> {
        Box::pin(async move {
            let inner = self.inner.lock().expect("sheet lock");
            inner.check()?;
            Ok(inner.rows.get(row as usize - 1).cloned().unwrap_or_default())
        })
    }

    fn write_range(&self, range: String, rows: Vec<Vec<String>>) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().expect("sheet lock");
            inner.check()?;
            let (from, _to) = range
                .split_once(':')
                .ok_or_else(|| SheetError::Payload(format!("malformed range: {range}")))?;
            let (column, row) = parse_cell_ref(from)
                .ok_or_else(|| SheetError::Payload(format!("malformed cell: {from}")))?;
            for (row_offset, cells) in rows.iter().enumerate() {
                for (column_offset, value) in cells.iter().enumerate() {
                    let column = column as usize + column_offset;
                    let row = row as usize + row_offset;
                    inner.ensure(column, row);
                    inner.rows[row - 1][column - 1] = value.clone();
                }
            }
            Ok(())
        })
    }

    fn append_row(&self, values: Vec<String>) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().expect("sheet lock");
            inner.check()?;
            inner.rows.push(values);
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().expect("sheet lock");
            inner.check()?;
            inner.rows.clear();
            Ok(())
        })
    }
}
