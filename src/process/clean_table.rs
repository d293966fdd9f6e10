use serde::Serialize;

/// A typed cell of the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Storage type of a cleaned column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Cell>,
}

/// Final, typed output of the normalization pipeline.
///
/// Never mutated once built: the export stage only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanTable {
    columns: Vec<Column>,
}

impl CleanTable {
    /// All columns must hold the same number of values.
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        debug_assert!(columns
            .windows(2)
            .all(|w| w[0].values.len() == w[1].values.len()));
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Cells of row `idx`, in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Cell>> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Rows with their zero-based index.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Vec<&Cell>)> + '_ {
        (0..self.num_rows()).map(move |i| (i, self.columns.iter().map(|c| &c.values[i]).collect()))
    }
}
