use tracing::debug;

use super::clean_table::{Cell, Column, ColumnKind};
use super::names::{CellRole, MappedColumn};
use super::utils;

fn text_cell(raw: Option<&str>) -> Cell {
    match raw.map(utils::collapse_ws) {
        Some(s) if !s.is_empty() => Cell::Text(s),
        _ => Cell::Null,
    }
}

fn reference_cell(raw: Option<&str>) -> Cell {
    let cleaned = raw.map(|s| {
        let collapsed = utils::collapse_ws(s);
        collapsed.replace(['[', ']'], "").trim().to_string()
    });
    match cleaned {
        Some(s) if !s.is_empty() => Cell::Text(s),
        _ => Cell::Null,
    }
}

fn numeric_cell(raw: Option<&str>) -> Cell {
    raw.and_then(utils::parse_number)
        .map_or(Cell::Null, Cell::Number)
}

/// Unmapped columns: trimmed text, promoted to numbers when every present
/// value reads as one (thousands separators allowed).
fn passthrough_cells(cells: &[Option<String>]) -> (ColumnKind, Vec<Cell>) {
    let trimmed: Vec<Option<&str>> = cells
        .iter()
        .map(|c| c.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .collect();

    let any_present = trimmed.iter().any(Option::is_some);
    let all_numeric = trimmed
        .iter()
        .flatten()
        .all(|s| utils::parse_thousands(s).is_some());

    if any_present && all_numeric {
        let values = trimmed
            .iter()
            .map(|c| c.and_then(utils::parse_thousands).map_or(Cell::Null, Cell::Number))
            .collect();
        (ColumnKind::Number, values)
    } else {
        let values = trimmed
            .iter()
            .map(|c| c.map_or(Cell::Null, |s| Cell::Text(s.to_string())))
            .collect();
        (ColumnKind::Text, values)
    }
}

/// Coerce one column according to the role of its business name.
pub fn coerce_column(col: MappedColumn) -> Column {
    let role = col.name.role();
    let (kind, values): (ColumnKind, Vec<Cell>) = match role {
        CellRole::Text => (
            ColumnKind::Text,
            col.cells.iter().map(|c| text_cell(c.as_deref())).collect(),
        ),
        CellRole::Reference => (
            ColumnKind::Text,
            col.cells.iter().map(|c| reference_cell(c.as_deref())).collect(),
        ),
        CellRole::Rank | CellRole::Numeric => (
            ColumnKind::Number,
            col.cells.iter().map(|c| numeric_cell(c.as_deref())).collect(),
        ),
        CellRole::Passthrough => passthrough_cells(&col.cells),
    };

    let nulls = values.iter().filter(|v| v.is_null()).count();
    debug!(column = %col.name, ?role, ?kind, nulls, "coerced");

    Column {
        name: col.name.to_string(),
        kind,
        values,
    }
}

/// Stage 4a: typed columns, order preserved.
pub fn coerce_columns(columns: Vec<MappedColumn>) -> Vec<Column> {
    columns.into_iter().map(coerce_column).collect()
}
