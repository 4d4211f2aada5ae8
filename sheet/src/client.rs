use futures::future::BoxFuture;

#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("the sink rejected the request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("the sink returned an unusable payload: {0}")]
    Payload(String),
    #[error("the sink is unavailable: {0}")]
    Unavailable(String),
}

pub type SheetResult<T> = Result<T, SheetError>;

/// Seam over the external spreadsheet product.
///
/// Columns and rows are 1-based; ranges use A1 notation. Reading a row past
/// the end of the table yields an empty vector, not an error.
pub trait SheetApi: Send + Sync {
    fn read_row(&self, row: u32) -> BoxFuture<'_, SheetResult<Vec<String>>>;

    /// Writes a rectangular block of cells at `range`.
    fn write_range(&self, range: String, rows: Vec<Vec<String>>) -> BoxFuture<'_, SheetResult<()>>;

    fn append_row(&self, values: Vec<String>) -> BoxFuture<'_, SheetResult<()>>;

    fn clear(&self) -> BoxFuture<'_, SheetResult<()>>;
}

/// `1 -> "A"`, `26 -> "Z"`, `27 -> "AA"`.
pub fn column_letters(column: u32) -> String {
    debug_assert!(column >= 1);
    let mut column = column;
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

pub fn cell_ref(column: u32, row: u32) -> String {
    format!("{}{row}", column_letters(column))
}

pub fn range_ref(from_column: u32, from_row: u32, to_column: u32, to_row: u32) -> String {
    format!("{}:{}", cell_ref(from_column, from_row), cell_ref(to_column, to_row))
}

/// Parses a single A1 cell reference back into `(column, row)`.
pub fn parse_cell_ref(cell: &str) -> Option<(u32, u32)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut column = 0u32;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        column = column * 26 + (c as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    Some((column, row))
}
