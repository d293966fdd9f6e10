use tracing::debug;

use super::names::{BusinessColumn, MappedColumn};

/// Fields retired from the delivered report, dropped even when the source provides them.
pub const RETIRED_COLUMNS: [BusinessColumn; 2] =
    [BusinessColumn::StateOwned, BusinessColumn::Reference];

/// Header-less source columns come out of the table reader as `Unnamed: N...`.
pub fn is_placeholder_column(canonical: &str) -> bool {
    canonical.contains("unnamed")
}

pub fn is_retired(column: &BusinessColumn) -> bool {
    RETIRED_COLUMNS.contains(column)
}

/// Stage 3: drop placeholder and retired columns. Absent columns are a no-op.
pub fn prune_columns(columns: Vec<MappedColumn>) -> Vec<MappedColumn> {
    columns
        .into_iter()
        .filter(|col| {
            let keep = !is_placeholder_column(col.name.as_str()) && !is_retired(&col.name);
            if !keep {
                debug!(column = %col.name, "pruned");
            }
            keep
        })
        .collect()
}
