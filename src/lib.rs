//! # timetag
//!
//! Base abstractions for time-tagged astronomical data series: event lists,
//! light curves and power spectra that need to round-trip between in-memory
//! arrays and tabular or persisted formats.
//!
//! ## Features
//!
//! - **Tabular round-trips**: any [`DataSeries`] converts to and from a
//!   columnar [`Table`], a polars `DataFrame`, a labeled JSON column store,
//!   and format-keyed files (ASCII with metadata headers, or a versioned JSON
//!   snapshot)
//! - **Time handling**: normalization of calendar times, MJD values,
//!   durations and unit-tagged quantities into seconds from an MJD epoch,
//!   with an optional high-precision split representation
//! - **GTI logic**: Good Time Interval validation, masking, merging, and
//!   GTI-aware segmentation into fixed-length chunks for spectral analysis
//! - **Rebinning**: merging uniformly sampled series into wider bins with
//!   linear apportionment at bin edges
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`table`]: the in-memory columnar table all conversions pivot through
//! - [`series`]: the [`DataSeries`] trait providing the generic conversions
//! - [`timeseries`]: the [`TimeSeries`] object and its GTI-aware operations
//! - [`time`]: time representations and their normalization
//! - [`gti`]: Good Time Intervals and segmentation helpers
//! - [`rebin`]: rebinning of uniformly sampled data
//!
//! All operations are synchronous, pure computations over in-memory arrays.
//! Objects own their buffers exclusively; derived objects never alias their
//! parent's arrays, so callers can partition work (e.g. with
//! [`TimeSeries::split_by_gti`]) and process the pieces on separate threads.

pub mod error;
pub mod gti;
mod io;
pub mod rebin;
pub mod series;
pub mod table;
pub mod time;
pub mod timeseries;

pub use error::{Error, Result};
pub use gti::{
    bin_intervals_from_gtis, check_gtis, contiguous_regions, create_gti_mask, merge_gti_union,
    time_intervals_from_gtis, Gti,
};
pub use rebin::{optimal_bin_time, rebin_data};
pub use series::{DataSeries, Format};
pub use table::{Column, Table};
pub use time::{interpret_times, ModifiedJulianDate, TimeInput, SECONDS_PER_DAY};
pub use timeseries::{TimeArray, TimeSeries};
