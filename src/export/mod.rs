// src/export/mod.rs
pub mod arrow;
pub mod xlsx;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use crate::process::CleanTable;

pub use self::arrow::{build_arrow_schema, to_record_batch};
pub use self::xlsx::{to_xlsx_bytes, write_xlsx};

/// Output file formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Parquet,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| anyhow!("output path {} has no extension", path.display()))?;
        match ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => bail!("unsupported output format {:?} for {}", other, path.display()),
        }
    }

    pub fn ext(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Parquet => "parquet",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn export_metadata() -> HashMap<String, String> {
    HashMap::from([
        ("generated_at".to_string(), Utc::now().to_rfc3339()),
        (
            "generator".to_string(),
            concat!("rankscrape ", env!("CARGO_PKG_VERSION")).to_string(),
        ),
    ])
}

fn write_parquet(table: &CleanTable, file: File) -> Result<()> {
    let batch = to_record_batch(table, export_metadata())?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for report")?;
    writer.write(&batch).context("writing report batch")?;
    writer.close().context("closing report writer")?;
    Ok(())
}

fn write_csv(table: &CleanTable, file: File) -> Result<()> {
    let batch = to_record_batch(table, HashMap::new())?;
    let mut writer = ::arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(&batch).context("writing CSV report")?;
    writer.into_inner().flush()?;
    Ok(())
}

/// One JSON object per row, keyed by column name.
pub fn to_json_records(table: &CleanTable) -> Result<Vec<Map<String, Value>>> {
    let names = table.column_names();
    table
        .rows()
        .map(|(_, row)| {
            names
                .iter()
                .zip(row)
                .map(|(name, cell)| -> Result<(String, Value)> {
                    Ok((name.to_string(), serde_json::to_value(cell)?))
                })
                .collect::<Result<Map<String, Value>>>()
        })
        .collect()
}

fn write_json(table: &CleanTable, file: File) -> Result<()> {
    let records = to_json_records(table)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &records).context("serializing JSON report")?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Persist the cleaned table at `path` (format from the extension).
///
/// Parent directories are created; the file is written to a temporary
/// sibling and renamed into place. Returns the final path.
#[tracing::instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn save_table(table: &CleanTable, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let format = OutputFormat::from_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("output path {} has no file name", path.display()))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
    let file = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;

    let written = match format {
        OutputFormat::Xlsx => write_xlsx(table, file),
        OutputFormat::Parquet => write_parquet(table, file),
        OutputFormat::Csv => write_csv(table, file),
        OutputFormat::Json => write_json(table, file),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;

    info!(rows = table.num_rows(), format = format.ext(), "saved report");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{clean_table_default, ColumnLabel, RawTable};
    use ::arrow::array::{Array, Int64Array, StringArray};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn sample() -> CleanTable {
        let row = |v: [&str; 3]| {
            v.iter()
                .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                .collect::<Vec<_>>()
        };
        clean_table_default(RawTable::from_rows(
            vec![
                ColumnLabel::from(["Rank", "Rank"]),
                ColumnLabel::from(["Name", "Name"]),
                ColumnLabel::from(["Employees", "Employees"]),
            ],
            vec![
                row(["2", "Amazon, Inc.", "1,525,000"]),
                row(["1", "Walmart", ""]),
            ],
        ))
    }

    #[test]
    fn format_from_extension() -> Result<()> {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.parquet"))?, OutputFormat::Parquet);
        assert_eq!(OutputFormat::from_path(Path::new("b.CSV"))?, OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("b.json"))?, OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out/b.xlsx"))?, OutputFormat::Xlsx);
        assert!(OutputFormat::from_path(Path::new("b.xls")).is_err());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
        Ok(())
    }

    #[test]
    fn parquet_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("outputs").join("report.parquet");
        let written = save_table(&sample(), &path)?;
        assert_eq!(written, path);
        assert!(!dir.path().join("outputs").join(".report.parquet.tmp").exists());

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches: Vec<_> = reader.collect::<std::result::Result<_, _>>()?;
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 2);
        assert!(batch.schema().metadata().contains_key("generated_at"));

        let rank = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(rank.values().to_vec(), vec![1, 2]);
        let company = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(company.value(0), "Walmart");
        let employees = batch.column(2).as_any().downcast_ref::<Int64Array>().unwrap();
        assert!(employees.is_null(0));
        assert_eq!(employees.value(1), 1_525_000);
        Ok(())
    }

    #[test]
    fn xlsx_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("outputs").join("report.xlsx");
        save_table(&sample(), &path)?;
        assert!(!dir.path().join("outputs").join(".report.xlsx.tmp").exists());

        let mut book: Xlsx<_> = open_workbook(&path)?;
        let range = book.worksheet_range(xlsx::SHEET_NAME)?;
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![
                Data::String("rank".into()),
                Data::String("company".into()),
                Data::String("employees".into()),
            ]
        );
        assert_eq!(rows[1][0], Data::Float(1.0));
        assert_eq!(rows[1][1], Data::String("Walmart".into()));
        assert_eq!(rows[1][2], Data::Empty);
        assert_eq!(rows[2][1], Data::String("Amazon, Inc.".into()));
        assert_eq!(rows[2][2], Data::Float(1_525_000.0));
        Ok(())
    }

    #[test]
    fn csv_has_header_and_quotes() -> Result<()> {
        let dir = tempdir()?;
        let path = save_table(&sample(), dir.path().join("report.csv"))?;
        let text = fs::read_to_string(path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "rank,company,employees");
        assert_eq!(lines[1], "1,Walmart,");
        assert_eq!(lines[2], "2,\"Amazon, Inc.\",1525000");
        Ok(())
    }

    #[test]
    fn json_records() -> Result<()> {
        let dir = tempdir()?;
        let path = save_table(&sample(), dir.path().join("report.json"))?;
        let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        assert_eq!(
            value,
            serde_json::json!([
                {"rank": 1.0, "company": "Walmart", "employees": null},
                {"rank": 2.0, "company": "Amazon, Inc.", "employees": 1525000.0}
            ])
        );
        Ok(())
    }

    #[test]
    fn unsupported_extension_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.ods");
        assert!(save_table(&sample(), &path).is_err());
        assert!(!path.exists());
    }
}
