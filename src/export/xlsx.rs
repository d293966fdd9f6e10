// src/export/xlsx.rs

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::{fs::File, io::Write};

use crate::process::{Cell, CleanTable};

pub static SHEET_NAME: &str = "Sheet1";

fn put_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Null => {}
        Cell::Number(v) => {
            sheet.write_number(row, col, *v)?;
        }
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Render the table as a single-sheet workbook: bold header row, then one
/// row per record. Null cells stay blank.
pub fn to_xlsx_bytes(table: &CleanTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.column_names().iter().enumerate() {
        let col = u16::try_from(col).context("too many columns for a worksheet")?;
        sheet.write_string_with_format(0, col, *name, &header)?;
    }

    for (idx, row) in table.rows() {
        let r = u32::try_from(idx + 1).context("too many rows for a worksheet")?;
        for (col, cell) in row.into_iter().enumerate() {
            let col = u16::try_from(col).context("too many columns for a worksheet")?;
            put_cell(sheet, r, col, cell)?;
        }
    }

    workbook.save_to_buffer().context("rendering workbook")
}

pub fn write_xlsx(table: &CleanTable, mut file: File) -> Result<()> {
    let bytes = to_xlsx_bytes(table)?;
    file.write_all(&bytes).context("writing workbook")?;
    file.flush()?;
    Ok(())
}
