/// Literal fragment the table reader emits for a header cell with no value.
pub const MISSING_TOKEN: &str = "nan";

/// A column header as read from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLabel {
    /// Single header row.
    Flat(String),
    /// One fragment per header row, outermost first.
    Composite(Vec<String>),
}

impl From<&str> for ColumnLabel {
    fn from(s: &str) -> Self {
        ColumnLabel::Flat(s.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnLabel {
    fn from(parts: [&str; N]) -> Self {
        ColumnLabel::Composite(parts.iter().map(|p| p.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub label: ColumnLabel,
    /// One entry per row; `None` for an empty cell.
    pub cells: Vec<Option<String>>,
}

/// The table exactly as extracted from the document, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    /// Build a table from header labels and row-major data.
    ///
    /// Short rows are padded with empty cells; cells beyond the last label are dropped.
    pub fn from_rows(labels: Vec<ColumnLabel>, rows: Vec<Vec<Option<String>>>) -> Self {
        let mut columns: Vec<RawColumn> = labels
            .into_iter()
            .map(|label| RawColumn {
                label,
                cells: Vec::with_capacity(rows.len()),
            })
            .collect();

        for row in rows {
            let mut row = row.into_iter();
            for col in columns.iter_mut() {
                col.cells.push(row.next().flatten());
            }
        }

        Self { columns }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
