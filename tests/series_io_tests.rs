//! Integration tests for file persistence and alternative tabular
//! representations.

use num_complex::Complex64;
use serde_json::json;
use tempfile::tempdir;

use timetag::{Column, DataSeries, Error, Gti, TimeInput, TimeSeries};

fn sample_series() -> TimeSeries {
    let mut ts = TimeSeries::new(TimeInput::Seconds(vec![0.0, 1.0, 2.0, 3.0]), 55000.0);
    ts.dt = 1.0;
    ts.gti = Some(vec![Gti::from_pair([0.0, 4.0])]);
    ts.timesys = Some("TDB".to_string());
    ts.add_array_attr("counts", vec![10i64, 20, 30, 40]).unwrap();
    ts.set_meta_attr("mission", json!("nicer"));
    ts
}

fn complex_series() -> TimeSeries {
    let mut ts = sample_series();
    ts.add_array_attr(
        "cross",
        vec![
            Complex64::new(1.0, -4.0),
            Complex64::new(2.0, -3.0),
            Complex64::new(3.0, -2.0),
            Complex64::new(4.0, -1.0),
        ],
    )
    .unwrap();
    ts
}

#[test]
fn test_ascii_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("series.ecsv");

    let ts = sample_series();
    ts.write(&path, None).unwrap();
    let back = TimeSeries::read(&path, None).unwrap();

    assert_eq!(back.time_values(), ts.time_values());
    assert_eq!(back.array_attr("counts"), ts.array_attr("counts"));
    assert_eq!(back.mjdref, 55000.0);
    assert_eq!(back.dt, 1.0);
    assert_eq!(back.timesys.as_deref(), Some("TDB"));
    assert_eq!(back.gti, Some(vec![Gti::from_pair([0.0, 4.0])]));
    assert_eq!(back.meta_attr("mission"), Some(&json!("nicer")));
}

#[test]
fn test_ascii_splits_complex_columns_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cross.ecsv");

    let ts = complex_series();
    ts.write(&path, Some("ascii")).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let header = text
        .lines()
        .find(|l| !l.starts_with('#'))
        .expect("CSV header line");
    assert!(header.contains("cross.real"));
    assert!(header.contains("cross.imag"));
    assert!(!header.split(',').any(|name| name == "cross"));
}

#[test]
fn test_complex_column_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cross.ecsv");

    let ts = complex_series();
    ts.write(&path, None).unwrap();
    let back = TimeSeries::read(&path, None).unwrap();

    assert_eq!(back.array_attr("cross"), ts.array_attr("cross"));
}

#[test]
fn test_read_recombines_partial_imaginary_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("imag_only.ecsv");

    // A file written by some other tool, carrying only the imaginary half.
    std::fs::write(
        &path,
        "#meta mjdref=55000.0\ntime,flux.imag\n0.0,1.5\n1.0,2.5\n",
    )
    .unwrap();

    let ts = TimeSeries::read(&path, None).unwrap();
    assert_eq!(
        ts.array_attr("flux"),
        Some(&Column::Complex(vec![
            Complex64::new(0.0, 1.5),
            Complex64::new(0.0, 2.5),
        ]))
    );
}

#[test]
fn test_read_recombines_real_only_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("real_only.ecsv");

    std::fs::write(&path, "time,flux.real\n0.0,1.5\n1.0,2.5\n").unwrap();

    let ts = TimeSeries::read(&path, None).unwrap();
    assert_eq!(
        ts.array_attr("flux"),
        Some(&Column::Complex(vec![
            Complex64::new(1.5, 0.0),
            Complex64::new(2.5, 0.0),
        ]))
    );
}

#[test]
fn test_snapshot_roundtrip_preserves_high_precision() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("series.json");

    let mut ts = TimeSeries::new_high_precision(
        TimeInput::Seconds(vec![123456789.000001, 123456790.000002]),
        55000.0,
    );
    ts.add_array_attr("counts", vec![1.0, 2.0]).unwrap();

    ts.write(&path, Some("json")).unwrap();
    let back = TimeSeries::read(&path, Some("json")).unwrap();

    // The snapshot bypasses the tabular conversion, so the split time
    // representation comes back bit-for-bit.
    assert_eq!(back, ts);
}

#[test]
fn test_unknown_format_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("series.h5");

    let ts = sample_series();
    let err = ts.write(&path, Some("hdf5")).unwrap_err();
    assert!(matches!(err, Error::Format(_)));

    let err = TimeSeries::read(&path, Some("hdf5")).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn test_dataframe_roundtrip() {
    let ts = complex_series();
    let df = ts.to_dataframe().unwrap();
    assert_eq!(df.height(), 4);

    let back = TimeSeries::from_dataframe(&df).unwrap();
    assert_eq!(back.time_values(), ts.time_values());
    assert_eq!(back.array_attr("counts"), ts.array_attr("counts"));
    assert_eq!(back.array_attr("cross"), ts.array_attr("cross"));
}

#[test]
fn test_column_store_roundtrip() {
    let ts = sample_series();
    let store = ts.to_column_store().unwrap();

    assert!(store.get("columns").and_then(|c| c.get("time")).is_some());
    assert_eq!(
        store.get("attrs").and_then(|a| a.get("mission")),
        Some(&json!("nicer"))
    );

    let back = TimeSeries::from_column_store(&store).unwrap();
    assert_eq!(back, ts);
}

#[test]
fn test_column_store_skips_colliding_metadata() {
    let mut ts = sample_series();
    ts.set_meta_attr("counts", json!("also a column name"));

    let store = ts.to_column_store().unwrap();
    assert!(store.get("attrs").and_then(|a| a.get("counts")).is_none());
    assert!(store.get("columns").and_then(|c| c.get("counts")).is_some());
}

#[test]
fn test_array_and_meta_attr_listing() {
    let ts = sample_series();

    let arrays = ts.array_attrs();
    assert_eq!(arrays, vec!["time".to_string(), "counts".to_string()]);

    let metas = ts.meta_attrs();
    assert!(metas.contains(&"mjdref".to_string()));
    assert!(metas.contains(&"gti".to_string()));
    assert!(metas.contains(&"mission".to_string()));
    assert!(!metas.contains(&"ephem".to_string()));

    let meta = ts.meta_dict();
    assert_eq!(meta.get("timesys"), Some(&json!("TDB")));
}
