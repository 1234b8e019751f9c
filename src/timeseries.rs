//! Time series objects: a time array, aligned per-sample attributes, and
//! series-level metadata.
//!
//! A [`TimeSeries`] owns its arrays exclusively. Masking, GTI filtering and
//! splitting always allocate fresh buffers for the result; no output ever
//! aliases the arrays of the series it was derived from, so the pieces can be
//! handed to different threads without coordination.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::gti::{check_gtis, create_gti_mask, Gti};
use crate::series::DataSeries;
use crate::table::{Column, Table};
use crate::time::{interpret_times, TimeInput, SECONDS_PER_DAY};

/// The time array of a series, in seconds from the MJD epoch.
///
/// The standard representation is a plain `f64` array. For sub-microsecond
/// work over long baselines, epoch-relative values grow large enough that a
/// single double loses significant digits; the high-precision representation
/// splits each value into exact whole seconds and a small sub-second
/// remainder, so shifts never erode the integral part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeArray {
    Standard(Vec<f64>),
    HighPrecision { secs: Vec<i64>, frac: Vec<f64> },
}

impl Default for TimeArray {
    fn default() -> Self {
        TimeArray::Standard(Vec::new())
    }
}

impl TimeArray {
    pub fn from_seconds(values: Vec<f64>) -> Self {
        TimeArray::Standard(values)
    }

    /// Split each value into whole seconds and a remainder in `[0, 1)`.
    pub fn from_seconds_high_precision(values: Vec<f64>) -> Self {
        let secs = values.iter().map(|v| v.div_euclid(1.0) as i64).collect();
        let frac = values.iter().map(|v| v.rem_euclid(1.0)).collect();
        TimeArray::HighPrecision { secs, frac }
    }

    pub fn len(&self) -> usize {
        match self {
            TimeArray::Standard(v) => v.len(),
            TimeArray::HighPrecision { secs, .. } => secs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the values as plain doubles.
    pub fn values(&self) -> Vec<f64> {
        match self {
            TimeArray::Standard(v) => v.clone(),
            TimeArray::HighPrecision { secs, frac } => secs
                .iter()
                .zip(frac)
                .map(|(&s, &f)| s as f64 + f)
                .collect(),
        }
    }

    /// Select the entries where `mask` is true.
    pub fn select(&self, mask: &[bool]) -> TimeArray {
        match self {
            TimeArray::Standard(v) => TimeArray::Standard(
                v.iter()
                    .zip(mask)
                    .filter(|(_, &keep)| keep)
                    .map(|(&t, _)| t)
                    .collect(),
            ),
            TimeArray::HighPrecision { secs, frac } => {
                let kept: Vec<(i64, f64)> = secs
                    .iter()
                    .zip(frac)
                    .zip(mask)
                    .filter(|(_, &keep)| keep)
                    .map(|((&s, &f), _)| (s, f))
                    .collect();
                TimeArray::HighPrecision {
                    secs: kept.iter().map(|&(s, _)| s).collect(),
                    frac: kept.iter().map(|&(_, f)| f).collect(),
                }
            }
        }
    }

    /// A copy with `offset` seconds added to every value.
    ///
    /// In the high-precision representation the integral part of the offset
    /// is applied to the whole seconds exactly; only the sub-second parts go
    /// through floating-point addition.
    pub fn shifted(&self, offset: f64) -> TimeArray {
        match self {
            TimeArray::Standard(v) => {
                TimeArray::Standard(v.iter().map(|t| t + offset).collect())
            }
            TimeArray::HighPrecision { secs, frac } => {
                let offset_secs = offset.div_euclid(1.0) as i64;
                let offset_frac = offset.rem_euclid(1.0);
                let mut new_secs = Vec::with_capacity(secs.len());
                let mut new_frac = Vec::with_capacity(frac.len());
                for (&s, &f) in secs.iter().zip(frac) {
                    let mut sum = f + offset_frac;
                    let mut carry = 0i64;
                    if sum >= 1.0 {
                        sum -= 1.0;
                        carry = 1;
                    }
                    new_secs.push(s + offset_secs + carry);
                    new_frac.push(sum);
                }
                TimeArray::HighPrecision {
                    secs: new_secs,
                    frac: new_frac,
                }
            }
        }
    }
}

/// A time-tagged series: a mandatory time array, any number of per-sample
/// array attributes of the same length, and series-level metadata.
///
/// Times are seconds from the `mjdref` epoch. `dt` is the nominal bin width;
/// 0 means event-like (unbinned) data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    time: TimeArray,
    /// Epoch of the time values, as a Modified Julian Date.
    pub mjdref: f64,
    /// Nominal bin width in seconds; 0 for event data.
    pub dt: f64,
    /// Free-form notes about the series.
    pub notes: String,
    /// Ephemeris used for barycentric corrections, if any.
    pub ephem: Option<String>,
    /// Time reference frame (e.g. "local", "solarsystem").
    pub timeref: Option<String>,
    /// Time system (e.g. "TDB", "UTC").
    pub timesys: Option<String>,
    /// Good Time Intervals, in seconds from the epoch.
    pub gti: Option<Vec<Gti>>,
    arrays: BTreeMap<String, Column>,
    extra_meta: Map<String, Value>,
}

impl TimeSeries {
    /// Build a series from any supported time representation.
    ///
    /// The input is normalized to seconds from `mjdref` (see
    /// [`interpret_times`]); absolute calendar inputs may update the epoch.
    pub fn new(time: TimeInput, mjdref: f64) -> TimeSeries {
        let (seconds, mjdref) = interpret_times(time, mjdref);
        TimeSeries {
            time: TimeArray::from_seconds(seconds),
            mjdref,
            ..TimeSeries::default()
        }
    }

    /// Like [`TimeSeries::new`], storing the time array in the
    /// high-precision split representation.
    pub fn new_high_precision(time: TimeInput, mjdref: f64) -> TimeSeries {
        let (seconds, mjdref) = interpret_times(time, mjdref);
        TimeSeries {
            time: TimeArray::from_seconds_high_precision(seconds),
            mjdref,
            ..TimeSeries::default()
        }
    }

    pub fn time(&self) -> &TimeArray {
        &self.time
    }

    /// The time values as plain doubles.
    pub fn time_values(&self) -> Vec<f64> {
        self.time.values()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Attach a per-sample array attribute.
    ///
    /// The array must be exactly as long as the time array; a mismatch is a
    /// configuration error and leaves the series untouched.
    pub fn add_array_attr(&mut self, name: &str, values: impl Into<Column>) -> Result<()> {
        let column = values.into();
        if column.len() != self.time.len() {
            return Err(Error::configuration(format!(
                "lengths of time and {} must be equal (got {} and {})",
                name,
                self.time.len(),
                column.len()
            )));
        }
        self.arrays.insert(name.to_string(), column);
        Ok(())
    }

    pub fn array_attr(&self, name: &str) -> Option<&Column> {
        self.arrays.get(name)
    }

    pub fn remove_array_attr(&mut self, name: &str) -> Option<Column> {
        self.arrays.remove(name)
    }

    pub fn array_attr_names(&self) -> Vec<&str> {
        self.arrays.keys().map(String::as_str).collect()
    }

    /// Attach a metadata attribute. Well-known keys (`mjdref`, `dt`, `notes`,
    /// `ephem`, `timeref`, `timesys`, `gti`) update the corresponding typed
    /// field; anything else lands in the free-form metadata map.
    pub fn set_meta_attr(&mut self, key: &str, value: Value) {
        match key {
            "mjdref" => {
                if let Some(v) = value.as_f64() {
                    self.mjdref = v;
                }
            }
            "dt" => {
                if let Some(v) = value.as_f64() {
                    self.dt = v;
                }
            }
            "notes" => {
                if let Some(s) = value.as_str() {
                    self.notes = s.to_string();
                }
            }
            "ephem" => self.ephem = value.as_str().map(str::to_string),
            "timeref" => self.timeref = value.as_str().map(str::to_string),
            "timesys" => self.timesys = value.as_str().map(str::to_string),
            "gti" => match serde_json::from_value::<Vec<[f64; 2]>>(value.clone()) {
                Ok(pairs) => {
                    self.gti = Some(pairs.into_iter().map(Gti::from_pair).collect());
                }
                Err(_) => {
                    log::warn!("could not parse 'gti' metadata as interval pairs; keeping it as free-form metadata");
                    self.extra_meta.insert(key.to_string(), value);
                }
            },
            _ => {
                self.extra_meta.insert(key.to_string(), value);
            }
        }
    }

    pub fn meta_attr(&self, key: &str) -> Option<&Value> {
        self.extra_meta.get(key)
    }

    /// Keep only the samples where `mask` is true, returning a new series.
    ///
    /// `time` is always kept. When `filtered_attrs` is given, array
    /// attributes not listed are dropped from the result so that no stale
    /// array can disagree with the filtered time axis; otherwise every array
    /// attribute is filtered and kept. Metadata is carried over in full.
    pub fn apply_mask(
        &self,
        mask: &[bool],
        filtered_attrs: Option<&[&str]>,
    ) -> Result<TimeSeries> {
        if mask.len() != self.time.len() {
            return Err(Error::configuration(format!(
                "mask length {} does not match the time array length {}",
                mask.len(),
                self.time.len()
            )));
        }

        let mut arrays = BTreeMap::new();
        for (name, column) in &self.arrays {
            if let Some(kept) = filtered_attrs {
                if !kept.contains(&name.as_str()) {
                    log::debug!("dropping array attribute '{}' not in the filtered set", name);
                    continue;
                }
            }
            arrays.insert(name.clone(), column.select(mask));
        }

        Ok(TimeSeries {
            time: self.time.select(mask),
            mjdref: self.mjdref,
            dt: self.dt,
            notes: self.notes.clone(),
            ephem: self.ephem.clone(),
            timeref: self.timeref.clone(),
            timesys: self.timesys.clone(),
            gti: self.gti.clone(),
            arrays,
            extra_meta: self.extra_meta.clone(),
        })
    }

    /// In-place variant of [`TimeSeries::apply_mask`].
    pub fn apply_mask_inplace(
        &mut self,
        mask: &[bool],
        filtered_attrs: Option<&[&str]>,
    ) -> Result<()> {
        *self = self.apply_mask(mask, filtered_attrs)?;
        Ok(())
    }

    /// Filter the series down to the samples inside its GTIs.
    ///
    /// The GTI list is validated first; absent GTIs are a configuration
    /// error.
    pub fn apply_gtis(&self) -> Result<TimeSeries> {
        let gti = self
            .gti
            .as_deref()
            .ok_or_else(|| Error::configuration("the series has no GTIs to apply"))?;
        check_gtis(gti)?;
        let mask = create_gti_mask(&self.time_values(), gti, self.dt);
        self.apply_mask(&mask, None)
    }

    /// In-place variant of [`TimeSeries::apply_gtis`].
    pub fn apply_gtis_inplace(&mut self) -> Result<()> {
        *self = self.apply_gtis()?;
        Ok(())
    }

    /// Split the series into one independent series per GTI.
    ///
    /// Uses the series' own GTIs unless `gti` is given. Each output covers a
    /// single GTI and carries that one-element GTI list. Segments with fewer
    /// than `min_points` samples are skipped. Output order follows GTI order.
    pub fn split_by_gti(
        &self,
        gti: Option<&[Gti]>,
        min_points: usize,
    ) -> Result<Vec<TimeSeries>> {
        let own_gti = match gti {
            Some(g) => g,
            None => self
                .gti
                .as_deref()
                .ok_or_else(|| Error::configuration("the series has no GTIs to split by"))?,
        };
        check_gtis(own_gti)?;

        let time_values = self.time_values();
        let mut pieces = Vec::new();
        for g in own_gti {
            let mask = create_gti_mask(&time_values, std::slice::from_ref(g), self.dt);
            let n_samples = mask.iter().filter(|&&m| m).count();
            if n_samples < min_points {
                log::debug!(
                    "skipping GTI [{}, {}) with only {} samples",
                    g.start,
                    g.stop,
                    n_samples
                );
                continue;
            }
            let mut piece = self.apply_mask(&mask, None)?;
            piece.gti = Some(vec![*g]);
            pieces.push(piece);
        }
        Ok(pieces)
    }

    /// A copy with the time values and the GTI boundaries shifted by
    /// `seconds`. The receiver is left untouched.
    pub fn shift(&self, seconds: f64) -> TimeSeries {
        let mut shifted = self.clone();
        shifted.time = shifted.time.shifted(seconds);
        if let Some(gti) = shifted.gti.as_mut() {
            for g in gti.iter_mut() {
                g.start += seconds;
                g.stop += seconds;
            }
        }
        shifted
    }

    /// Refer the series to a new MJD epoch.
    ///
    /// Time values and GTIs are shifted by `(old - new) * 86400` seconds and
    /// the new epoch is stamped on the copy.
    pub fn change_mjdref(&self, new_mjdref: f64) -> TimeSeries {
        let time_shift = (self.mjdref - new_mjdref) * SECONDS_PER_DAY;
        let mut shifted = self.shift(time_shift);
        shifted.mjdref = new_mjdref;
        shifted
    }
}

impl DataSeries for TimeSeries {
    const MAIN_COLUMN: &'static str = "time";

    fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.add_column(Self::MAIN_COLUMN, Column::F64(self.time_values()));
        for (name, column) in &self.arrays {
            table.add_column(name.clone(), column.clone());
        }

        table.set_meta("mjdref", json!(self.mjdref));
        table.set_meta("dt", json!(self.dt));
        table.set_meta("notes", json!(self.notes));
        if let Some(ephem) = &self.ephem {
            table.set_meta("ephem", json!(ephem));
        }
        if let Some(timeref) = &self.timeref {
            table.set_meta("timeref", json!(timeref));
        }
        if let Some(timesys) = &self.timesys {
            table.set_meta("timesys", json!(timesys));
        }
        if let Some(gti) = &self.gti {
            let pairs: Vec<[f64; 2]> = gti.iter().map(|g| [g.start, g.stop]).collect();
            table.set_meta("gti", json!(pairs));
        }
        for (key, value) in &self.extra_meta {
            if value.is_null() {
                continue;
            }
            table.set_meta(key.clone(), value.clone());
        }
        table
    }

    fn from_table(table: &Table) -> Result<TimeSeries> {
        if table.n_rows() == 0 {
            return Ok(TimeSeries::default());
        }

        let time_column = table.column(Self::MAIN_COLUMN).ok_or_else(|| {
            Error::format(format!(
                "table does not contain the reference column '{}'",
                Self::MAIN_COLUMN
            ))
        })?;

        let mut series = TimeSeries {
            time: TimeArray::from_seconds(time_column.as_f64()),
            ..TimeSeries::default()
        };

        for (name, column) in table.columns() {
            if name == Self::MAIN_COLUMN {
                continue;
            }
            series.add_array_attr(&name.to_lowercase(), column.clone())?;
        }
        for (key, value) in &table.meta {
            series.set_meta_attr(&key.to_lowercase(), value.clone());
        }
        Ok(series)
    }
}
