// src/export/arrow.rs

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

use crate::process::{Cell, CleanTable, Column, ColumnKind};

// Largest magnitude at which every integer is exactly representable as f64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn is_integral(v: f64) -> bool {
    v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT
}

/// Map a cleaned column onto an Arrow DataType.
///
/// - text                          -> Utf8
/// - numbers, all whole            -> Int64
/// - numbers, any fractional value -> Float64
pub fn column_data_type(col: &Column) -> DataType {
    match col.kind {
        ColumnKind::Text => DataType::Utf8,
        ColumnKind::Number => {
            if col
                .values
                .iter()
                .filter_map(Cell::as_number)
                .all(is_integral)
            {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
    }
}

/// Build an ArrowSchema (inside an Arc) for the table; every field is nullable.
pub fn build_arrow_schema(table: &CleanTable, metadata: HashMap<String, String>) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = table
        .columns()
        .iter()
        .map(|col| ArrowField::new(&col.name, column_data_type(col), /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields).with_metadata(metadata))
}

fn to_array(col: &Column, ty: &DataType) -> ArrayRef {
    match ty {
        DataType::Int64 => Arc::new(Int64Array::from(
            col.values
                .iter()
                .map(|c| c.as_number().map(|v| v as i64))
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            col.values.iter().map(Cell::as_number).collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            col.values.iter().map(Cell::as_text).collect::<Vec<_>>(),
        )),
    }
}

/// Convert the cleaned table into a single Arrow record batch.
pub fn to_record_batch(table: &CleanTable, metadata: HashMap<String, String>) -> Result<RecordBatch> {
    if table.num_columns() == 0 {
        bail!("table has no columns to export");
    }

    let schema = build_arrow_schema(table, metadata);
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(col, field)| to_array(col, field.data_type()))
        .collect();

    RecordBatch::try_new(schema, arrays).context("building record batch from cleaned table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{clean_table_default, ColumnLabel, RawTable};
    use arrow::array::Array;

    fn sample() -> CleanTable {
        let row = |v: [&str; 4]| v.iter().map(|s| Some(s.to_string())).collect::<Vec<_>>();
        clean_table_default(RawTable::from_rows(
            vec![
                ColumnLabel::from("Rank"),
                ColumnLabel::from("Name"),
                ColumnLabel::from("Revenue (USD millions)"),
                ColumnLabel::from("Profit (USD millions)"),
            ],
            vec![
                row(["1", "Walmart", "$648,125", "15,511.5"]),
                row(["2", "Amazon", "$574,785", "N/A"]),
            ],
        ))
    }

    #[test]
    fn types_follow_values() -> Result<()> {
        let batch = to_record_batch(&sample(), HashMap::new())?;
        let schema = batch.schema();
        let types: Vec<&DataType> = schema.fields().iter().map(|f| f.data_type()).collect();
        assert_eq!(
            types,
            vec![
                &DataType::Int64,
                &DataType::Utf8,
                &DataType::Int64,
                &DataType::Float64
            ]
        );
        assert_eq!(batch.num_rows(), 2);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));

        let profit = batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(profit.value(0), 15511.5);
        assert!(profit.is_null(1));
        Ok(())
    }

    #[test]
    fn empty_table_cannot_be_exported() {
        assert!(to_record_batch(&CleanTable::default(), HashMap::new()).is_err());
    }
}
