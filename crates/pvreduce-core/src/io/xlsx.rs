use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::consts::DATETIME_FORMAT;
use crate::dataset::{Column, Dataset, Index, Value};
use crate::error::{PvError, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Excel's day zero for serial date numbers (1900 date system).
fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial date number to a datetime, millisecond precision.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    excel_epoch().checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Convert a datetime to an Excel serial date number.
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    (dt - excel_epoch()).num_milliseconds() as f64 / MILLIS_PER_DAY
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::Float(f) => Value::Float(*f),
        Data::Int(i) => Value::Float(*i as f64),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::String(s) if s.is_empty() => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64()).map_or(Value::Missing, Value::DateTime),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_or_else(|_| Value::Text(s.clone()), Value::DateTime),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

/// Raw grid of the first worksheet: header cells and per-column values.
struct Grid {
    headers: Vec<Value>,
    columns: Vec<Vec<Value>>,
}

fn read_grid(path: &Path) -> Result<Grid> {
    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Grid {
            headers: Vec::new(),
            columns: Vec::new(),
        });
    };
    let range = workbook.worksheet_range(&sheet)?;

    // The range starts at the first non-empty cell; a blank A1 shifts it.
    let col_offset = range.start().map_or(0, |(_, c)| c as usize);
    let width = col_offset + range.width();

    let mut rows = range.rows();
    let mut headers = vec![Value::Missing; col_offset];
    if let Some(header) = rows.next() {
        headers.extend(header.iter().map(cell_to_value));
    }
    headers.resize(width, Value::Missing);

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); width];
    for row in rows {
        for column in columns.iter_mut().take(col_offset) {
            column.push(Value::Missing);
        }
        for (c, cell) in row.iter().enumerate() {
            columns[col_offset + c].push(cell_to_value(cell));
        }
    }

    debug!(
        path = %path.display(),
        rows = columns.first().map_or(0, Vec::len),
        columns = width,
        "Read worksheet"
    );
    Ok(Grid { headers, columns })
}

/// Header text as pandas names it: blank headers become `Unnamed: <col>`,
/// repeated names get a `.<n>` suffix.
fn header_names(headers: &[Value]) -> Vec<String> {
    let mut seen: IndexMap<String, usize> = IndexMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.is_missing() {
                format!("Unnamed: {i}")
            } else {
                h.key()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn build(index: Index, names: Vec<String>, columns: Vec<Vec<Value>>) -> Result<Dataset> {
    let mut dataset = Dataset::new(index);
    for (name, values) in names.into_iter().zip(columns) {
        dataset.insert(name, Column::from_values(values))?;
    }
    Ok(dataset)
}

/// Read the first worksheet as a plain table with `0..n` row labels.
pub fn read_table(path: &Path) -> Result<Dataset> {
    let grid = read_grid(path)?;
    let rows = grid.columns.first().map_or(0, Vec::len);
    build(Index::range(rows), header_names(&grid.headers), grid.columns)
}

fn label_text(value: &Value, path: &Path) -> Result<String> {
    if value.is_missing() {
        return Err(PvError::InvalidSheet(format!(
            "{}: missing index label",
            path.display()
        )));
    }
    Ok(value.key())
}

fn label_int(value: &Value, path: &Path) -> Result<i64> {
    match value {
        Value::Float(f) if f.is_finite() => Ok(*f as i64),
        _ => Err(PvError::InvalidSheet(format!(
            "{}: non-integer row label {:?}",
            path.display(),
            value
        ))),
    }
}

/// Read a dataset written by [`write_dataset`], restoring its index from the
/// leading header cells. Sheets without a recognizable index are read as
/// plain tables.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let grid = read_grid(path)?;
    let Grid {
        headers,
        mut columns,
    } = grid;
    let header_text = |i: usize| headers.get(i).filter(|h| !h.is_missing()).map(Value::key);

    let (index, skip) = match (header_text(0).as_deref(), header_text(1).as_deref()) {
        (Some("experiment"), Some("reading")) => {
            let experiments = columns[0]
                .iter()
                .map(|v| label_text(v, path))
                .collect::<Result<Vec<_>>>()?;
            let readings = columns[1]
                .iter()
                .map(|v| label_int(v, path))
                .collect::<Result<Vec<_>>>()?;
            (
                Index::Reading {
                    experiments,
                    readings,
                },
                2,
            )
        }
        (Some("experiment"), _) => {
            let keys = columns[0]
                .iter()
                .map(|v| label_text(v, path))
                .collect::<Result<Vec<_>>>()?;
            (Index::Experiment(keys), 1)
        }
        (None, _) if !headers.is_empty() => {
            let labels = columns[0]
                .iter()
                .map(|v| label_int(v, path))
                .collect::<Result<Vec<_>>>()?;
            (Index::Rows(labels), 1)
        }
        _ => {
            let rows = columns.first().map_or(0, Vec::len);
            return build(Index::range(rows), header_names(&headers), columns);
        }
    };

    let names = header_names(&headers).split_off(skip);
    let data = columns.split_off(skip);
    build(index, names, data)
}

/// Write a dataset to a single-sheet workbook: index columns first, then
/// every data column. Missing and non-finite numbers are left blank.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    let col = |c: usize| {
        u16::try_from(c).map_err(|_| PvError::InvalidSheet(format!("too many columns ({c})")))
    };
    let row = |r: usize| {
        u32::try_from(r + 1).map_err(|_| PvError::InvalidSheet(format!("too many rows ({r})")))
    };

    let index_width = match dataset.index() {
        Index::Reading {
            experiments,
            readings,
        } => {
            worksheet.write_string(0, 0, "experiment")?;
            worksheet.write_string(0, 1, "reading")?;
            for (r, (key, reading)) in experiments.iter().zip(readings).enumerate() {
                worksheet.write_string(row(r)?, 0, key)?;
                worksheet.write_number(row(r)?, 1, *reading as f64)?;
            }
            2
        }
        Index::Experiment(keys) => {
            worksheet.write_string(0, 0, "experiment")?;
            for (r, key) in keys.iter().enumerate() {
                worksheet.write_string(row(r)?, 0, key)?;
            }
            1
        }
        Index::Rows(labels) => {
            for (r, label) in labels.iter().enumerate() {
                worksheet.write_number(row(r)?, 0, *label as f64)?;
            }
            1
        }
    };

    for (c, (name, column)) in dataset.columns().enumerate() {
        let c = col(index_width + c)?;
        worksheet.write_string(0, c, name)?;
        match column {
            Column::Float(values) => {
                for (r, v) in values.iter().enumerate() {
                    if v.is_finite() {
                        worksheet.write_number(row(r)?, c, *v)?;
                    }
                }
            }
            Column::Text(values) => {
                for (r, v) in values.iter().enumerate() {
                    if let Some(s) = v {
                        worksheet.write_string(row(r)?, c, s)?;
                    }
                }
            }
            Column::DateTime(values) => {
                for (r, v) in values.iter().enumerate() {
                    if let Some(dt) = v {
                        worksheet.write_number_with_format(
                            row(r)?,
                            c,
                            datetime_to_serial(*dt),
                            &datetime_format,
                        )?;
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    debug!(path = %path.display(), rows = dataset.len(), "Wrote worksheet");
    Ok(())
}
