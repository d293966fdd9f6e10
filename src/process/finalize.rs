use std::cmp::Ordering;
use tracing::debug;

use super::clean_table::{Cell, CleanTable, Column};
use super::names::BusinessColumn;

/// Ascending, with rows lacking a number placed last.
fn cmp_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn take_rows(columns: Vec<Column>, order: &[usize]) -> Vec<Column> {
    columns
        .into_iter()
        .map(|col| {
            let mut slots: Vec<Option<Cell>> = col.values.into_iter().map(Some).collect();
            let values = order
                .iter()
                .map(|&i| slots.get_mut(i).and_then(Option::take).unwrap_or(Cell::Null))
                .collect();
            Column {
                name: col.name,
                kind: col.kind,
                values,
            }
        })
        .collect()
}

/// Stage 4b: drop rows with no value in any column, then order by `rank`
/// (stable; missing ranks last). Row positions in the result start at zero.
pub fn finalize_rows(columns: Vec<Column>) -> CleanTable {
    let num_rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
    let at = |col: &Column, i: usize| col.values.get(i).unwrap_or(&Cell::Null).as_number();

    let mut order: Vec<usize> = (0..num_rows)
        .filter(|&i| columns.iter().any(|c| c.values.get(i).is_some_and(|v| !v.is_null())))
        .collect();
    let dropped = num_rows - order.len();

    let rank_name = BusinessColumn::Rank.to_string();
    if let Some(rank) = columns.iter().find(|c| c.name == rank_name) {
        order.sort_by(|&a, &b| cmp_nulls_last(at(rank, a), at(rank, b)));
    }

    debug!(rows = order.len(), dropped, "finalized rows");
    CleanTable::new(take_rows(columns, &order))
}
