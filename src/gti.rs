//! Good Time Intervals and GTI-aware segmentation.
//!
//! A GTI is a half-open `[start, stop)` window, in seconds from the series
//! epoch, during which the instrument was collecting valid data. Spectral
//! analysis downstream needs evenly sized data chunks that never straddle a
//! gap between GTIs; the helpers in this module derive those chunks, either as
//! time windows or as sample-index ranges over a uniform time grid.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerance used when comparing chunk boundaries against GTI edges, so that
/// a GTI exactly as long as the chunk still yields one chunk.
const EDGE_TOLERANCE: f64 = 1e-9;

/// A Good Time Interval: a half-open `[start, stop)` window in seconds from
/// the series epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gti {
    pub start: f64,
    pub stop: f64,
}

impl Gti {
    /// Create a new interval; `None` if the bounds are not strictly ordered.
    pub fn new(start: f64, stop: f64) -> Option<Self> {
        if start < stop {
            Some(Self { start, stop })
        } else {
            None
        }
    }

    pub fn from_pair(pair: [f64; 2]) -> Self {
        Self {
            start: pair[0],
            stop: pair[1],
        }
    }

    /// Length of the interval.
    pub fn duration(&self) -> qtty::Seconds {
        qtty::Seconds::new(self.stop - self.start)
    }

    /// Check if an instant lies inside this interval (inclusive start,
    /// exclusive stop).
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.stop
    }

    /// Check if this interval overlaps with another.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.stop && other.start < self.stop
    }
}

/// Validate a GTI list: nonempty, strictly ordered pairs, sorted, and
/// non-overlapping.
pub fn check_gtis(gtis: &[Gti]) -> Result<()> {
    if gtis.is_empty() {
        return Err(Error::configuration("no GTIs provided"));
    }
    for (i, g) in gtis.iter().enumerate() {
        if g.start >= g.stop {
            return Err(Error::configuration(format!(
                "GTI {} has start {} >= stop {}",
                i, g.start, g.stop
            )));
        }
        if i > 0 && g.start < gtis[i - 1].stop {
            return Err(Error::configuration(format!(
                "GTIs must be sorted and non-overlapping; GTI {} starts at {} before the previous stop {}",
                i, g.start, gtis[i - 1].stop
            )));
        }
    }
    Ok(())
}

/// Boolean mask of the samples falling inside at least one GTI.
///
/// With `dt == 0` (event data) a sample counts if its instant lies in the
/// half-open interval. With `dt > 0` (binned data) the whole bin
/// `[t - dt/2, t + dt/2]` must fit inside the GTI.
pub fn create_gti_mask(time: &[f64], gtis: &[Gti], dt: f64) -> Vec<bool> {
    time.iter()
        .map(|&t| {
            gtis.iter().any(|g| {
                if dt == 0.0 {
                    g.contains(t)
                } else {
                    t - dt / 2.0 >= g.start - EDGE_TOLERANCE
                        && t + dt / 2.0 <= g.stop + EDGE_TOLERANCE
                }
            })
        })
        .collect()
}

/// Sort a set of possibly overlapping intervals and merge them into a minimal
/// disjoint union.
pub fn merge_gti_union(gtis: &[Gti]) -> Vec<Gti> {
    let mut sorted = gtis.to_vec();
    sorted.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<Gti> = Vec::new();
    for gti in sorted {
        if let Some(last) = merged.last_mut() {
            if gti.start <= last.stop {
                if gti.stop > last.stop {
                    last.stop = gti.stop;
                }
                continue;
            }
        }
        merged.push(gti);
    }
    merged
}

/// Find contiguous `true` runs of a boolean array.
///
/// Returns `[start, stop)` index pairs, one per run.
pub fn contiguous_regions(condition: &[bool]) -> Vec<[usize; 2]> {
    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &flag) in condition.iter().enumerate() {
        match (flag, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                regions.push([start, i]);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        regions.push([start, condition.len()]);
    }
    regions
}

/// Equal-length time windows compatible with the GTIs.
///
/// Each window starts aligned to a GTI start (or to the end of the previous
/// window in the same GTI) and never crosses the GTI's stop. GTIs shorter
/// than `chunk_length` are discarded.
///
/// Fails with a segmentation error when no GTI can hold a single chunk:
/// downstream spectral code cannot proceed with zero segments, so an empty
/// result must be loud.
pub fn time_intervals_from_gtis(
    gtis: &[Gti],
    chunk_length: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut start_times = Vec::new();
    for g in gtis {
        if g.stop - g.start < chunk_length {
            continue;
        }
        let mut t0 = g.start;
        while t0 + chunk_length <= g.stop + EDGE_TOLERANCE {
            start_times.push(t0);
            t0 += chunk_length;
        }
    }

    if start_times.is_empty() {
        return Err(Error::segmentation(chunk_length));
    }

    let stop_times = start_times.iter().map(|&t| t + chunk_length).collect();
    Ok((start_times, stop_times))
}

/// The same chunking as [`time_intervals_from_gtis`], expressed as sample
/// indices over a uniform time grid.
///
/// `time` holds the bin center times, with bin width `time[1] - time[0]`.
/// Start and stop indices are snapped inward so that every chunk of
/// `floor(chunk_length / bin_width)` bins lies strictly within its GTI.
/// Returns `[start, stop)` bin-index pairs.
pub fn bin_intervals_from_gtis(
    gtis: &[Gti],
    chunk_length: f64,
    time: &[f64],
) -> Result<(Vec<usize>, Vec<usize>)> {
    if time.len() < 2 {
        return Err(Error::configuration(
            "at least two time samples are needed to derive the bin width",
        ));
    }
    let bin_time = time[1] - time[0];
    if bin_time <= 0.0 {
        return Err(Error::configuration(
            "time array must be increasing to derive the bin width",
        ));
    }
    let nbin = (chunk_length / bin_time).floor() as usize;
    if nbin == 0 {
        return Err(Error::configuration(format!(
            "chunk length {} is shorter than the bin width {}",
            chunk_length, bin_time
        )));
    }

    let mut start_bins = Vec::new();
    let mut stop_bins = Vec::new();
    for g in gtis {
        if g.stop - g.start < chunk_length {
            continue;
        }
        // Bins whose full extent lies inside the GTI.
        let inside = |i: usize| {
            time[i] - bin_time / 2.0 >= g.start - EDGE_TOLERANCE
                && time[i] + bin_time / 2.0 <= g.stop + EDGE_TOLERANCE
        };
        let first = (0..time.len()).find(|&i| inside(i));
        let first = match first {
            Some(i) => i,
            None => continue,
        };
        let mut last = first;
        while last + 1 < time.len() && inside(last + 1) {
            last += 1;
        }

        let mut start = first;
        while start + nbin <= last + 1 {
            start_bins.push(start);
            stop_bins.push(start + nbin);
            start += nbin;
        }
    }

    if start_bins.is_empty() {
        return Err(Error::segmentation(chunk_length));
    }
    Ok((start_bins, stop_bins))
}
