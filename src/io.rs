//! File and dataframe backends for the tabular conversions.
//!
//! The ASCII format keeps the table metadata in `#meta key=<json>` header
//! lines and the columns in a regular CSV body, so files stay readable with
//! any CSV tool while round-tripping the metadata exactly.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::Column as PlColumn;
use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, DataType, SerReader, SerWriter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::table::{Column, Table};

/// Version tag written into snapshot files.
const SNAPSHOT_VERSION: u64 = 1;

const META_PREFIX: &str = "#meta ";

/// Write a table as `#meta` header lines plus a CSV body.
pub(crate) fn write_table_ascii(table: &Table, path: &Path) -> Result<()> {
    let mut out = String::new();
    for (key, value) in &table.meta {
        out.push_str(META_PREFIX);
        out.push_str(key);
        out.push('=');
        out.push_str(&serde_json::to_string(value)?);
        out.push('\n');
    }

    if table.n_columns() > 0 {
        let mut df = table_to_dataframe(table)?;
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .finish(&mut df)?;
        let body = String::from_utf8(buffer)
            .map_err(|e| Error::format(format!("CSV body is not valid UTF-8: {}", e)))?;
        out.push_str(&body);
    }

    std::fs::write(path, out)?;
    Ok(())
}

/// Read a table written by [`write_table_ascii`].
pub(crate) fn read_table_ascii(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path)?;

    let mut meta = Map::new();
    let mut body = String::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(META_PREFIX) {
            if let Some((key, value)) = rest.split_once('=') {
                let parsed = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                meta.insert(key.trim().to_string(), parsed);
            }
        } else if line.starts_with('#') {
            continue;
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    let mut table = Table::new();
    table.meta = meta;
    if body.trim().is_empty() {
        return Ok(table);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()?;
    let mut with_columns = dataframe_to_table(&df)?;
    with_columns.meta = table.meta;
    Ok(with_columns)
}

/// Write a versioned JSON snapshot of a whole object.
pub(crate) fn write_snapshot<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let snapshot = json!({
        "format_version": SNAPSHOT_VERSION,
        "data": serde_json::to_value(value)?,
    });
    std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}

/// Read a snapshot written by [`write_snapshot`].
pub(crate) fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    let snapshot: Value = serde_json::from_str(&text)?;

    let version = snapshot
        .get("format_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::format("snapshot file carries no format version"))?;
    if version != SNAPSHOT_VERSION {
        return Err(Error::format(format!(
            "unsupported snapshot version {} (expected {})",
            version, SNAPSHOT_VERSION
        )));
    }

    let data = snapshot
        .get("data")
        .ok_or_else(|| Error::format("snapshot file carries no data"))?;
    Ok(serde_json::from_value(data.clone())?)
}

/// Convert a table to a polars dataframe. Complex columns must already be
/// split into their real and imaginary parts.
pub(crate) fn table_to_dataframe(table: &Table) -> Result<DataFrame> {
    let mut columns: Vec<PlColumn> = Vec::with_capacity(table.n_columns());
    for (name, column) in table.columns() {
        match column {
            Column::F64(values) => columns.push(PlColumn::new(name.into(), values)),
            Column::I64(values) => columns.push(PlColumn::new(name.into(), values)),
            Column::Complex(_) => {
                return Err(Error::format(format!(
                    "column '{}' holds complex values, which dataframes cannot represent; split it first",
                    name
                )))
            }
        }
    }
    Ok(DataFrame::new(columns)?)
}

/// Convert a polars dataframe to a table. Missing values become NaN; non-
/// numeric columns are cast to doubles.
pub(crate) fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let mut table = Table::new();
    for column in df.get_columns() {
        let name = column.name().as_str().to_string();
        let series = column.as_materialized_series();
        let data = match series.dtype() {
            DataType::Int64 => Column::I64(
                series
                    .i64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0))
                    .collect(),
            ),
            DataType::Float64 => Column::F64(
                series
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            ),
            _ => {
                let cast = series.cast(&DataType::Float64)?;
                Column::F64(
                    cast.f64()?
                        .into_iter()
                        .map(|v| v.unwrap_or(f64::NAN))
                        .collect(),
                )
            }
        };
        table.add_column(name, data);
    }
    Ok(table)
}
