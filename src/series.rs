//! Generic tabular round-tripping for array-plus-metadata objects.
//!
//! Any type that can describe itself as a [`Table`] — per-sample arrays as
//! columns, everything else as table metadata — gets dataframe conversion,
//! a labeled column store, and format-keyed file persistence for free.
//! The reference column declared by `MAIN_COLUMN` anchors the partition:
//! columns are the arrays aligned with it, metadata is the rest.

use std::path::Path;

use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::io;
use crate::table::Table;

/// Persistence formats understood by [`DataSeries::read`] and
/// [`DataSeries::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `#meta` header lines followed by a CSV body. Complex columns are
    /// stored as `<name>.real` / `<name>.imag` pairs. The default.
    Ascii,
    /// Versioned JSON snapshot of the whole object graph, bypassing the
    /// tabular conversion.
    Snapshot,
}

impl Format {
    /// Resolve a format name; `None` selects the ASCII format.
    pub fn from_name(fmt: Option<&str>) -> Result<Format> {
        match fmt {
            None => Ok(Format::Ascii),
            Some(name) => match name.to_lowercase().as_str() {
                "ascii" | "csv" | "ecsv" => Ok(Format::Ascii),
                "json" => Ok(Format::Snapshot),
                other => Err(Error::format(format!("unknown format '{}'", other))),
            },
        }
    }
}

/// An object made of array attributes aligned with one reference array, plus
/// scalar metadata.
///
/// Implementors provide the two conversions to and from [`Table`]; every
/// other representation is derived from those.
pub trait DataSeries: Sized + Default + Serialize + DeserializeOwned {
    /// Name of the reference array column (e.g. `"time"` for a time series,
    /// `"freq"` for a spectrum). Array attributes are the columns aligned
    /// with it.
    const MAIN_COLUMN: &'static str;

    /// Express the object as a columnar table: one column per array
    /// attribute (the reference column first), non-null meta attributes in
    /// the table metadata.
    fn to_table(&self) -> Table;

    /// Rebuild an object from a table.
    ///
    /// The table must contain a column named [`Self::MAIN_COLUMN`] unless it
    /// has zero rows, in which case a default-constructed object is
    /// returned. Non-reference column names and metadata keys are folded to
    /// lowercase.
    fn from_table(table: &Table) -> Result<Self>;

    /// Names of the array attributes, reference column first.
    fn array_attrs(&self) -> Vec<String> {
        self.to_table()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Names of the non-null meta attributes.
    fn meta_attrs(&self) -> Vec<String> {
        self.to_table().meta.keys().cloned().collect()
    }

    /// All non-null meta attributes as a map.
    fn meta_dict(&self) -> Map<String, Value> {
        self.to_table().meta
    }

    /// Convert to a polars dataframe.
    ///
    /// Complex columns are split into `.real`/`.imag` pairs since dataframes
    /// have no complex dtype. Dataframes carry no table-level metadata, so
    /// meta attributes are not represented on this path.
    fn to_dataframe(&self) -> Result<DataFrame> {
        let mut table = self.to_table();
        table.split_complex_columns();
        io::table_to_dataframe(&table)
    }

    /// Rebuild an object from a polars dataframe. `.real`/`.imag` column
    /// pairs are recombined into complex columns first.
    fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut table = io::dataframe_to_table(df)?;
        table.merge_complex_columns();
        Self::from_table(&table)
    }

    /// Convert to a labeled column store: a JSON object with a `columns` map
    /// and an `attrs` map. Metadata keys colliding with a column name are
    /// skipped to keep the store unambiguous.
    fn to_column_store(&self) -> Result<Value> {
        let table = self.to_table();
        let mut columns = Map::new();
        for (name, column) in table.columns() {
            columns.insert(name.to_string(), serde_json::to_value(column)?);
        }
        let mut attrs = Map::new();
        for (key, value) in &table.meta {
            if columns.contains_key(key) {
                log::warn!(
                    "metadata key '{}' collides with a column name; skipping it",
                    key
                );
                continue;
            }
            attrs.insert(key.clone(), value.clone());
        }
        Ok(json!({ "columns": columns, "attrs": attrs }))
    }

    /// Rebuild an object from a labeled column store.
    fn from_column_store(value: &Value) -> Result<Self> {
        let mut table = Table::new();
        if let Some(columns) = value.get("columns").and_then(Value::as_object) {
            for (name, column) in columns {
                table.add_column(name.clone(), serde_json::from_value(column.clone())?);
            }
        }
        if let Some(attrs) = value.get("attrs").and_then(Value::as_object) {
            table.meta = attrs.clone();
        }
        Self::from_table(&table)
    }

    /// Write the object to `path` in the given format (see [`Format`]).
    fn write(&self, path: &Path, fmt: Option<&str>) -> Result<()> {
        match Format::from_name(fmt)? {
            Format::Snapshot => io::write_snapshot(self, path),
            Format::Ascii => {
                let mut table = self.to_table();
                table.split_complex_columns();
                io::write_table_ascii(&table, path)
            }
        }
    }

    /// Read an object from `path` in the given format (see [`Format`]).
    fn read(path: &Path, fmt: Option<&str>) -> Result<Self> {
        match Format::from_name(fmt)? {
            Format::Snapshot => io::read_snapshot(path),
            Format::Ascii => {
                let mut table = io::read_table_ascii(path)?;
                table.merge_complex_columns();
                Self::from_table(&table)
            }
        }
    }
}
