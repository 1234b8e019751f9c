//! In-memory columnar table with attached metadata.
//!
//! [`Table`] is the pivot representation for every conversion in this crate:
//! series objects turn into a `Table` before being written to disk or handed
//! to a dataframe, and are rebuilt from a `Table` on the way back. Columns are
//! plain numeric arrays; everything that is not per-sample data travels in the
//! table-level metadata map.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single named column's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Double-precision floating point values.
    F64(Vec<f64>),
    /// Signed integer values (e.g. detector channel numbers).
    I64(Vec<i64>),
    /// Complex values (e.g. cross spectra). Not every storage backend can
    /// represent these natively; see [`Table::split_complex_columns`].
    Complex(Vec<Complex64>),
}

impl Column {
    /// Number of samples in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::F64(v) => v.len(),
            Column::I64(v) => v.len(),
            Column::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the column as plain doubles. Integers are converted; for complex
    /// values the real part is taken.
    pub fn as_f64(&self) -> Vec<f64> {
        match self {
            Column::F64(v) => v.clone(),
            Column::I64(v) => v.iter().map(|&x| x as f64).collect(),
            Column::Complex(v) => v.iter().map(|c| c.re).collect(),
        }
    }

    /// View the column as complex values. Real-valued columns get a zero
    /// imaginary part.
    pub fn as_complex(&self) -> Vec<Complex64> {
        match self {
            Column::F64(v) => v.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            Column::I64(v) => v.iter().map(|&x| Complex64::new(x as f64, 0.0)).collect(),
            Column::Complex(v) => v.clone(),
        }
    }

    /// Select the entries where `mask` is true, preserving order.
    pub fn select(&self, mask: &[bool]) -> Column {
        fn pick<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(&v, _)| v)
                .collect()
        }
        match self {
            Column::F64(v) => Column::F64(pick(v, mask)),
            Column::I64(v) => Column::I64(pick(v, mask)),
            Column::Complex(v) => Column::Complex(pick(v, mask)),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Column::Complex(_))
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::F64(values)
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::I64(values)
    }
}

impl From<Vec<Complex64>> for Column {
    fn from(values: Vec<Complex64>) -> Self {
        Column::Complex(values)
    }
}

/// Ordered set of named columns plus a table-level metadata map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<(String, Column)>,
    /// Metadata attached to the table as a whole (epoch, GTIs, mission
    /// strings, ...). Values are arbitrary JSON.
    pub meta: Map<String, Value>,
}

impl Table {
    pub fn new() -> Table {
        Table::default()
    }

    /// Number of rows, taken from the first column (0 for a column-less table).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) {
        let name = name.into();
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name, column));
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.meta.insert(key.into(), value);
    }

    /// Replace every complex column with two real columns named
    /// `<name>.real` and `<name>.imag`.
    ///
    /// Text and columnar backends without a native complex type store complex
    /// data through this convention; [`Table::merge_complex_columns`] undoes it.
    pub fn split_complex_columns(&mut self) {
        let complex_names: Vec<String> = self
            .columns
            .iter()
            .filter(|(_, c)| c.is_complex())
            .map(|(n, _)| n.clone())
            .collect();

        for name in complex_names {
            if let Some(Column::Complex(values)) = self.remove_column(&name) {
                let re: Vec<f64> = values.iter().map(|c| c.re).collect();
                let im: Vec<f64> = values.iter().map(|c| c.im).collect();
                self.add_column(format!("{}.real", name), Column::F64(re));
                self.add_column(format!("{}.imag", name), Column::F64(im));
            }
        }
    }

    /// Recombine `<name>.real` / `<name>.imag` column pairs into complex
    /// columns named `<name>`.
    ///
    /// A missing half is treated as zero, so files carrying only the real or
    /// only the imaginary part still load. If a column named `<name>` already
    /// exists, the contributions are summed into it.
    pub fn merge_complex_columns(&mut self) {
        let part_names: Vec<String> = self
            .columns
            .iter()
            .map(|(n, _)| n.clone())
            .filter(|n| n.ends_with(".real") || n.ends_with(".imag"))
            .collect();

        for name in part_names {
            let (base, is_imag) = match name.strip_suffix(".real") {
                Some(base) => (base.to_string(), false),
                None => match name.strip_suffix(".imag") {
                    Some(base) => (base.to_string(), true),
                    None => continue,
                },
            };

            let part = match self.remove_column(&name) {
                Some(column) => column.as_f64(),
                None => continue,
            };

            let contribution: Vec<Complex64> = part
                .iter()
                .map(|&v| {
                    if is_imag {
                        Complex64::new(0.0, v)
                    } else {
                        Complex64::new(v, 0.0)
                    }
                })
                .collect();

            match self.column(&base) {
                Some(existing) => {
                    let merged: Vec<Complex64> = existing
                        .as_complex()
                        .iter()
                        .zip(&contribution)
                        .map(|(a, b)| a + b)
                        .collect();
                    self.add_column(base, Column::Complex(merged));
                }
                None => self.add_column(base, Column::Complex(contribution)),
            }
        }
    }
}
