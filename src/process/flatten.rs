use super::raw_table::{ColumnLabel, RawTable, MISSING_TOKEN};

/// Name used when every fragment of a composite header is empty.
pub const PLACEHOLDER_NAME: &str = "column";

/// A table whose headers are single strings, one per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub labels: Vec<String>,
    pub columns: Vec<Vec<Option<String>>>,
}

/// Collapse one header into a single name. Never returns an empty string
/// for a composite label.
pub fn flatten_label(label: &ColumnLabel) -> String {
    match label {
        ColumnLabel::Flat(name) => name.clone(),
        ColumnLabel::Composite(parts) => {
            let kept: Vec<&str> = parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty() && *p != MISSING_TOKEN)
                .collect();
            if kept.is_empty() {
                PLACEHOLDER_NAME.to_string()
            } else {
                kept.join(" ")
            }
        }
    }
}

/// Stage 1: one flat label per column, order preserved. Columns shorter
/// than the longest one are padded with empty cells.
pub fn flatten_headers(raw: RawTable) -> FlatTable {
    let height = raw.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
    let mut labels = Vec::with_capacity(raw.columns.len());
    let mut columns = Vec::with_capacity(raw.columns.len());
    for col in raw.columns {
        labels.push(flatten_label(&col.label));
        let mut cells = col.cells;
        cells.resize(height, None);
        columns.push(cells);
    }
    FlatTable { labels, columns }
}
