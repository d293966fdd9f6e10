// src/process/mod.rs
pub mod clean_table;
pub mod convert;
pub mod finalize;
pub mod flatten;
pub mod names;
pub mod prune;
pub mod raw_table;
pub mod utils;

pub use clean_table::{Cell, CleanTable, Column, ColumnKind};
pub use names::{normalize_column_name, BusinessColumn, NameMap};
pub use raw_table::{ColumnLabel, RawColumn, RawTable};

use tracing::info;

/// Turn an extracted table into the typed report table:
/// 1) flatten headers, 2) normalize + map names, 3) prune columns,
/// 4) coerce cells, drop empty rows, order by rank.
///
/// Never fails: unknown headers pass through, bad cells become nulls and
/// missing columns are skipped.
#[tracing::instrument(level = "info", skip_all, fields(columns = raw.num_columns(), rows = raw.num_rows()))]
pub fn clean_table(raw: RawTable, names: &NameMap) -> CleanTable {
    let flat = flatten::flatten_headers(raw);
    let mapped = names::map_columns(flat, names);
    let kept = prune::prune_columns(mapped);
    let typed = convert::coerce_columns(kept);
    let table = finalize::finalize_rows(typed);

    info!(
        columns = ?table.column_names(),
        rows = table.num_rows(),
        "cleaned table"
    );
    table
}

/// [`clean_table`] with the built-in column map.
pub fn clean_table_default(raw: RawTable) -> CleanTable {
    clean_table(raw, NameMap::builtin())
}
