use crate::error::{AppError, AppResult};
use crate::models::{CandidateDispute, RawRow, RawValue};
use crate::service::resolver::date_from_serial;
use calamine::{Data, Reader, Xlsx};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

/// Label given to header cells left blank
const BLANK_HEADER: &str = "__EMPTY";

/// Makes repeated header labels distinct: `Valor`, `Valor_1`, `Valor_2`...
/// The first occurrence keeps its label.
pub fn unique_labels<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut labels = Vec::new();

    for header in headers {
        let base = match header.as_ref().trim() {
            "" => BLANK_HEADER.to_string(),
            trimmed => trimmed.to_string(),
        };
        let mut label = base.clone();
        let mut n = 0;
        while !seen.insert(label.clone()) {
            n += 1;
            label = format!("{base}_{n}");
        }
        labels.push(label);
    }
    labels
}

/// Reads a CSV sheet with a header row into raw rows.
/// Empty cells become `Empty`, everything else stays text.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = unique_labels(rdr.headers()?.iter());
    let mut rows = Vec::new();

    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let value = match record.get(i) {
                    Some(cell) if !cell.trim().is_empty() => RawValue::Text(cell.to_string()),
                    _ => RawValue::Empty,
                };
                (label.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    tracing::debug!("CSV sheet read: {} columns, {} rows", headers.len(), rows.len());
    Ok(rows)
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) if s.trim().is_empty() => RawValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Float(n) => RawValue::Number(*n),
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            date_from_serial(serial)
                .map(RawValue::Date)
                .unwrap_or(RawValue::Number(serial))
        }
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        other => other.to_string(),
    }
}

/// Reads the first worksheet of an `.xlsx` workbook. The first row holds
/// the labels; date-formatted cells come back as `Date`, numbers as `Number`.
pub fn read_xlsx_rows(bytes: &[u8]) -> AppResult<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::InvalidRequest("workbook has no worksheets".to_string()))??;

    let mut lines = range.rows();
    let Some(header_row) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers = unique_labels(header_row.iter().map(header_text));

    let rows: Vec<RawRow> = lines
        .filter(|cells| cells.iter().any(|c| cell_value(c).is_present()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let value = cells.get(i).map(cell_value).unwrap_or(RawValue::Empty);
                    (label.clone(), value)
                })
                .collect()
        })
        .collect();

    tracing::debug!("Workbook sheet read: {} columns, {} rows", headers.len(), rows.len());
    Ok(rows)
}

fn option_to_csv<T: ToString>(val: &Option<T>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the review table (one line per candidate) as CSV
pub fn write_candidates_csv<W: Write>(candidates: &[CandidateDispute], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "row", "status", "message", "invoice_number", "invoice_id", "glosa_code", "description",
        "glossed_amount", "glosa_date", "due_date", "batch_label", "tier",
    ])?;

    for c in candidates {
        wtr.write_record(&[
            c.row.to_string(),
            c.status.as_str().to_string(),
            c.message.clone(),
            c.invoice_number.clone(),
            option_to_csv(&c.invoice_id),
            c.glosa_code.clone(),
            c.description.clone(),
            c.glossed_amount.to_string(),
            option_to_csv(&c.glosa_date),
            option_to_csv(&c.due_date),
            option_to_csv(&c.batch_label),
            option_to_csv(&c.tier),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
