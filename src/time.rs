//! Time representations and their normalization to seconds since an epoch.
//!
//! Stored times are always seconds elapsed since a Modified Julian Date
//! reference (`mjdref`). Input times, however, arrive in several shapes:
//! absolute calendar times, MJD values, duration offsets, unit-tagged physical
//! quantities, or plain numbers. [`interpret_times`] folds all of them into
//! the uniform internal representation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Seconds per mean solar day, the conversion factor between MJD differences
/// and stored time values.
pub const SECONDS_PER_DAY: f64 = qtty::time::SECONDS_PER_DAY;

/// Absolute MJD values below this are treated as small offsets rather than
/// real calendar dates (MJD 10000 is 1886-05-20, well before any X-ray
/// mission).
const MJD_EPOCH_THRESHOLD: f64 = 10000.0;

/// Modified Julian Date representation.
/// MJD 0 = 1858-11-17 00:00:00 UTC
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ModifiedJulianDate(qtty::Days);

impl ModifiedJulianDate {
    /// Create a new MJD value.
    pub fn new<V: Into<qtty::Days>>(v: V) -> Self {
        Self(v.into())
    }

    /// Raw MJD value as f64.
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.value() - 40587.0) * SECONDS_PER_DAY
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self::new(timestamp / SECONDS_PER_DAY + 40587.0)
    }

    /// Convert to chrono DateTime<Utc>.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = self.to_unix_timestamp();
        let secs_i64 = secs.floor() as i64;
        let nanos = ((secs - secs.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs_i64, nanos).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_unix_timestamp(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9)
    }
}

impl From<f64> for ModifiedJulianDate {
    fn from(v: f64) -> Self {
        ModifiedJulianDate::new(v)
    }
}

/// The supported input time representations.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    /// Absolute calendar times given as MJD values.
    Mjd(Vec<ModifiedJulianDate>),
    /// Absolute calendar times given as UTC datetimes.
    DateTimes(Vec<DateTime<Utc>>),
    /// Duration offsets from the epoch.
    Durations(Vec<TimeDelta>),
    /// Plain seconds from the epoch, passed through unchanged.
    Seconds(Vec<f64>),
    /// A single number of seconds from the epoch.
    Scalar(f64),
}

/// Unit-tagged physical quantities convert to seconds at the boundary.
impl<U: qtty::time::TimeUnit> From<Vec<qtty::Quantity<U>>> for TimeInput {
    fn from(values: Vec<qtty::Quantity<U>>) -> Self {
        TimeInput::Seconds(
            values
                .iter()
                .map(|q| q.to::<qtty::Second>().value())
                .collect(),
        )
    }
}

impl TimeInput {
    /// Interpret a dynamic JSON value as a time input.
    ///
    /// Numbers and arrays of numbers are accepted; anything else is an
    /// unrecognized time format.
    pub fn from_value(value: &Value) -> Result<TimeInput> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(TimeInput::Scalar)
                .ok_or_else(|| Error::unrecognized_time_format(format!("{}", n))),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_f64() {
                        Some(v) => out.push(v),
                        None => {
                            return Err(Error::unrecognized_time_format(format!(
                                "array element {}",
                                item
                            )))
                        }
                    }
                }
                Ok(TimeInput::Seconds(out))
            }
            other => Err(Error::unrecognized_time_format(format!("{}", other))),
        }
    }
}

/// Normalize a time input to seconds from an MJD epoch.
///
/// Absolute inputs (MJD values or datetimes) with `mjdref == 0` whose values
/// all exceed MJD 10000 auto-derive the epoch from the first value, so that
/// stored times start near zero. Duration, quantity and plain numeric inputs
/// pass the epoch through unchanged.
///
/// Returns the seconds array and the (possibly updated) epoch.
pub fn interpret_times(time: TimeInput, mjdref: f64) -> (Vec<f64>, f64) {
    match time {
        TimeInput::Mjd(mjds) => {
            let values: Vec<f64> = mjds.iter().map(|m| m.value()).collect();
            let epoch = if mjdref == 0.0
                && !values.is_empty()
                && values.iter().all(|&v| v > MJD_EPOCH_THRESHOLD)
            {
                values[0]
            } else {
                mjdref
            };
            let seconds = values.iter().map(|&v| (v - epoch) * SECONDS_PER_DAY).collect();
            (seconds, epoch)
        }
        TimeInput::DateTimes(datetimes) => {
            let mjds = datetimes
                .into_iter()
                .map(ModifiedJulianDate::from_datetime)
                .collect();
            interpret_times(TimeInput::Mjd(mjds), mjdref)
        }
        TimeInput::Durations(durations) => {
            let seconds = durations
                .iter()
                .map(|d| d.num_seconds() as f64 + d.subsec_nanos() as f64 * 1e-9)
                .collect();
            (seconds, mjdref)
        }
        TimeInput::Seconds(seconds) => (seconds, mjdref),
        TimeInput::Scalar(value) => (vec![value], mjdref),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_mjd_to_unix_timestamp() {
        // MJD 40587.0 corresponds to Unix epoch (1970-01-01)
        let mjd = ModifiedJulianDate::new(40587.0);
        assert!(mjd.to_unix_timestamp().abs() < 1.0);
    }

    #[test]
    fn test_mjd_roundtrip_unix() {
        let original = ModifiedJulianDate::new(59000.5);
        let roundtrip = ModifiedJulianDate::from_unix_timestamp(original.to_unix_timestamp());
        assert!((original.value() - roundtrip.value()).abs() < 1e-9);
    }

    #[test]
    fn test_mjd_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2016, 4, 5, 0, 0, 0).single().unwrap();
        let mjd = ModifiedJulianDate::from_datetime(dt);
        assert!((mjd.value() - 57483.0).abs() < 1e-6);
        assert_eq!(mjd.to_datetime(), dt);
    }

    #[test]
    fn test_interpret_times_mjd_derives_epoch() {
        let input = TimeInput::Mjd(vec![ModifiedJulianDate::new(57483.0)]);
        let (seconds, mjdref) = interpret_times(input, 0.0);
        assert_eq!(seconds, vec![0.0]);
        assert_eq!(mjdref, 57483.0);
    }

    #[test]
    fn test_interpret_times_mjd_keeps_explicit_epoch() {
        let input = TimeInput::Mjd(vec![
            ModifiedJulianDate::new(57483.0),
            ModifiedJulianDate::new(57483.5),
        ]);
        let (seconds, mjdref) = interpret_times(input, 57483.0);
        assert_eq!(mjdref, 57483.0);
        assert!((seconds[0] - 0.0).abs() < 1e-6);
        assert!((seconds[1] - 43200.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpret_times_small_mjds_not_treated_as_epoch() {
        // Values below the calendar-date threshold pass through as offsets.
        let input = TimeInput::Mjd(vec![ModifiedJulianDate::new(1.0)]);
        let (seconds, mjdref) = interpret_times(input, 0.0);
        assert_eq!(mjdref, 0.0);
        assert_eq!(seconds, vec![SECONDS_PER_DAY]);
    }

    #[test]
    fn test_interpret_times_durations() {
        let input = TimeInput::Durations(vec![
            TimeDelta::seconds(3),
            TimeDelta::seconds(4),
            TimeDelta::milliseconds(5500),
        ]);
        let (seconds, mjdref) = interpret_times(input, 45000.0);
        assert_eq!(mjdref, 45000.0);
        assert!((seconds[0] - 3.0).abs() < 1e-12);
        assert!((seconds[1] - 4.0).abs() < 1e-12);
        assert!((seconds[2] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_interpret_times_quantities() {
        let input: TimeInput = vec![qtty::Hours::new(1.0), qtty::Hours::new(2.0)].into();
        let (seconds, mjdref) = interpret_times(input, 45000.0);
        assert_eq!(mjdref, 45000.0);
        assert_eq!(seconds, vec![3600.0, 7200.0]);
    }

    #[test]
    fn test_interpret_times_plain_passthrough() {
        let (seconds, mjdref) =
            interpret_times(TimeInput::Seconds(vec![3.0, 4.0, 5.0]), 45000.0);
        assert_eq!(seconds, vec![3.0, 4.0, 5.0]);
        assert_eq!(mjdref, 45000.0);

        let (seconds, mjdref) = interpret_times(TimeInput::Scalar(1.0), 45000.0);
        assert_eq!(seconds, vec![1.0]);
        assert_eq!(mjdref, 45000.0);
    }

    #[test]
    fn test_from_value_accepts_numbers() {
        let input = TimeInput::from_value(&json!([3, 4, 5])).unwrap();
        assert_eq!(input, TimeInput::Seconds(vec![3.0, 4.0, 5.0]));

        let input = TimeInput::from_value(&json!(1.5)).unwrap();
        assert_eq!(input, TimeInput::Scalar(1.5));
    }

    #[test]
    fn test_from_value_rejects_non_numeric() {
        let err = TimeInput::from_value(&json!("guadfkljfd")).unwrap_err();
        assert!(matches!(err, crate::Error::UnrecognizedTimeFormat(_)));

        let err = TimeInput::from_value(&json!({"a": 1})).unwrap_err();
        assert!(matches!(err, crate::Error::UnrecognizedTimeFormat(_)));

        let err = TimeInput::from_value(&json!([1, "x"])).unwrap_err();
        assert!(matches!(err, crate::Error::UnrecognizedTimeFormat(_)));
    }
}
