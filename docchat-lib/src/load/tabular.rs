use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use tracing::debug;

use crate::{Error, Result};

/// Render CSV records as `header: value` lines.
///
/// Malformed records are skipped.
pub(super) fn extract_csv(bytes: &[u8]) -> String {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(e) => {
            debug!(error = %e, "unreadable csv header");
            return String::new();
        }
    };

    let mut lines = Vec::new();
    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => lines.extend(render_row(&headers, record.iter().map(str::to_string))),
            Err(e) => debug!(row = i + 1, error = %e, "skipping malformed csv record"),
        }
    }
    lines.join("\n")
}

/// Render every worksheet as a `# sheet` heading followed by one line per row,
/// using the first row as headers.
///
/// Worksheets that fail to read are skipped.
pub(super) fn extract_xlsx(bytes: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::Extraction(format!("unreadable xlsx workbook: {e}")))?;

    let mut sections = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&sheet) {
            Ok(range) => range,
            Err(e) => {
                debug!(sheet, error = %e, "skipping unreadable worksheet");
                continue;
            }
        };

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header_row.iter().map(cell_text).collect();
        let lines: Vec<String> = rows
            .filter_map(|row| render_row(&headers, row.iter().map(cell_text)))
            .collect();

        if !lines.is_empty() {
            sections.push(format!("# {sheet}\n{}", lines.join("\n")));
        }
    }
    Ok(sections.join("\n\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// `header: value, header: value`, skipping empty cells. Cells past the last
/// header are labelled by column number. `None` when every cell is empty.
fn render_row(headers: &[String], cells: impl Iterator<Item = String>) -> Option<String> {
    let parts: Vec<String> = cells
        .enumerate()
        .filter(|(_, value)| !value.is_empty())
        .map(|(i, value)| match headers.get(i).filter(|h| !h.is_empty()) {
            Some(header) => format!("{header}: {value}"),
            None => format!("column {}: {value}", i + 1),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}
