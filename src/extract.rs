// src/extract.rs

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::process::utils::collapse_ws;
use crate::process::{ColumnLabel, RawTable};

/// Selector used when none is configured: the first table in the document.
pub const DEFAULT_TABLE_SELECTOR: &str = "table";

const MAX_COLSPAN: usize = 1_000;
const MAX_ROWSPAN: usize = 65_534;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no table found on the page (selector {selector:?})")]
    NoTableFound { selector: String },
    #[error("invalid table selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Locate the first element matching `selector` and read it into a [`RawTable`].
///
/// Header rows are the `<thead>` rows or, without a `<thead>`, the leading
/// rows made only of `<th>` cells. `colspan`/`rowspan` are expanded so every
/// row has one entry per column.
pub fn parse_table(html: &str, selector: &str) -> Result<RawTable, ExtractError> {
    let sel = Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    let table = document
        .select(&sel)
        .next()
        .ok_or_else(|| ExtractError::NoTableFound {
            selector: selector.to_string(),
        })?;

    Ok(read_table(table))
}

/// A `<tr>` and whether it counts as header material.
struct SourceRow<'a> {
    el: ElementRef<'a>,
    in_thead: bool,
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Rows in reading order: thead, body (tbody or bare tr), tfoot.
fn source_rows(table: ElementRef<'_>) -> Vec<SourceRow<'_>> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();

    for child in child_elements(table) {
        match child.value().name() {
            "thead" => head.extend(
                child_elements(child)
                    .filter(|r| r.value().name() == "tr")
                    .map(|el| SourceRow { el, in_thead: true }),
            ),
            "tbody" => body.extend(
                child_elements(child)
                    .filter(|r| r.value().name() == "tr")
                    .map(|el| SourceRow { el, in_thead: false }),
            ),
            "tfoot" => foot.extend(
                child_elements(child)
                    .filter(|r| r.value().name() == "tr")
                    .map(|el| SourceRow { el, in_thead: false }),
            ),
            "tr" => body.push(SourceRow {
                el: child,
                in_thead: false,
            }),
            _ => {}
        }
    }

    head.extend(body);
    head.extend(foot);
    head
}

fn cells_of<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    child_elements(row)
        .filter(|c| matches!(c.value().name(), "th" | "td"))
        .collect()
}

fn span_attr(cell: ElementRef<'_>, name: &str, max: usize) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .map_or(1, |n| n.min(max))
}

/// Visible text of a cell; `<br>` reads as a space, style/script are skipped.
fn cell_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            match child_el.value().name() {
                "style" | "script" => {}
                "br" => out.push(' '),
                _ => out.push_str(&cell_text(child_el)),
            }
        }
    }
    out
}

fn put(row: &mut Vec<Option<String>>, idx: usize, value: Option<String>) {
    if row.len() <= idx {
        row.resize(idx + 1, None);
    }
    row[idx] = value;
}

type Pending = Option<(usize, Option<String>)>;

/// Copy a cell spanning down from an earlier row into `col`, if any.
fn fill_pending(pending: &mut [Pending], row: &mut Vec<Option<String>>, col: usize) -> bool {
    let Some(slot) = pending.get_mut(col) else {
        return false;
    };
    let Some((left, value)) = slot.as_mut() else {
        return false;
    };
    put(row, col, value.clone());
    *left -= 1;
    if *left == 0 {
        *slot = None;
    }
    true
}

/// Lay the rows out on a grid, copying spanned cells into every slot they cover.
fn expand_spans(rows: &[SourceRow<'_>]) -> Vec<Vec<Option<String>>> {
    // per column: (rows still covered, value)
    let mut pending: Vec<Pending> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for source in rows {
        let mut row: Vec<Option<String>> = Vec::new();
        let mut col = 0;

        for cell in cells_of(source.el) {
            while fill_pending(&mut pending, &mut row, col) {
                col += 1;
            }
            let text = cell_text(cell);
            let value = if text.trim().is_empty() { None } else { Some(text) };
            let colspan = span_attr(cell, "colspan", MAX_COLSPAN);
            let rowspan = span_attr(cell, "rowspan", MAX_ROWSPAN);

            for k in 0..colspan {
                put(&mut row, col + k, value.clone());
                if rowspan > 1 {
                    if pending.len() <= col + k {
                        pending.resize(col + k + 1, None);
                    }
                    pending[col + k] = Some((rowspan - 1, value.clone()));
                }
            }
            col += colspan;
        }

        while col < pending.len() {
            fill_pending(&mut pending, &mut row, col);
            col += 1;
        }

        grid.push(row);
    }

    grid
}

fn header_label(levels: &[&Vec<Option<String>>], col: usize) -> ColumnLabel {
    let fragment = |level: &Vec<Option<String>>| -> Option<String> {
        level
            .get(col)
            .and_then(|v| v.as_deref())
            .map(collapse_ws)
            .filter(|s| !s.is_empty())
    };

    match levels {
        [] => ColumnLabel::Flat(col.to_string()),
        [only] => ColumnLabel::Flat(fragment(*only).unwrap_or_else(|| format!("Unnamed: {}", col))),
        _ => ColumnLabel::Composite(
            levels
                .iter()
                .enumerate()
                .map(|(lvl, level)| {
                    fragment(*level).unwrap_or_else(|| format!("Unnamed: {}_level_{}", col, lvl))
                })
                .collect(),
        ),
    }
}

fn read_table(table: ElementRef<'_>) -> RawTable {
    let rows = source_rows(table);

    let thead_rows = rows.iter().take_while(|r| r.in_thead).count();
    let header_rows = if thead_rows > 0 {
        thead_rows
    } else {
        rows.iter()
            .take_while(|r| {
                let cells = cells_of(r.el);
                !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th")
            })
            .count()
    };

    let grid = expand_spans(&rows);
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let levels: Vec<&Vec<Option<String>>> = grid.iter().take(header_rows).collect();
    let labels: Vec<ColumnLabel> = (0..width).map(|c| header_label(&levels, c)).collect();
    let body: Vec<Vec<Option<String>>> = grid.into_iter().skip(header_rows).collect();

    debug!(
        header_rows,
        columns = width,
        rows = body.len(),
        "extracted table"
    );
    RawTable::from_rows(labels, body)
}
