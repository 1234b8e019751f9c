//! Rebinning of uniformly sampled series.

use crate::error::{Error, Result};

/// Rebin a uniformly sampled series `(x, y)` to a coarser resolution.
///
/// Samples straddling a new bin edge are apportioned linearly between the two
/// neighboring bins. `dx_new` must be at least the original resolution
/// `x[1] - x[0]`. A trailing bin that the data only partially covers is
/// dropped.
///
/// `method` selects how samples combine into a bin: `"sum"` adds them,
/// `"mean"` (also `"avg"`, `"average"`, `"arithmetic mean"`) divides the sum
/// by the number of old bins per new bin. Any other keyword is an
/// unrecognized-method error.
///
/// Returns the new bin centers, the binned values, and the step size
/// (old bins per new bin).
pub fn rebin_data(
    x: &[f64],
    y: &[f64],
    dx_new: f64,
    method: &str,
) -> Result<(Vec<f64>, Vec<f64>, f64)> {
    if x.len() < 2 || x.len() != y.len() {
        return Err(Error::configuration(
            "x and y must have equal lengths of at least two samples",
        ));
    }

    let dx_old = x[1] - x[0];
    if dx_new < dx_old {
        return Err(Error::configuration(format!(
            "new bin width {} must be larger than the old bin width {}",
            dx_new, dx_old
        )));
    }

    let step_size = dx_new / dx_old;
    let n = y.len();

    let mut output = Vec::new();
    let mut k = 0usize;
    loop {
        let i = k as f64 * step_size;
        if i >= n as f64 {
            break;
        }
        let int_i = i.floor() as usize;
        let prev_frac = int_i as f64 + 1.0 - i;
        let mut total = prev_frac * y[int_i];

        // Fractional part of the sample crossing the right bin edge.
        if i + step_size < n as f64 {
            let next_bin = (i + step_size).floor() as usize;
            let next_frac = i + step_size - next_bin as f64;
            total += next_frac * y[next_bin];
        }

        let inner_stop = ((i + step_size).floor() as usize).min(n);
        for &value in &y[(int_i + 1).min(n)..inner_stop] {
            total += value;
        }

        output.push(total);
        k += 1;
    }

    let ybin: Vec<f64> = match method {
        "sum" => output,
        "mean" | "avg" | "average" | "arithmetic mean" => {
            output.iter().map(|v| v / step_size).collect()
        }
        other => return Err(Error::unrecognized_method(other)),
    };

    // Drop the trailing bin when the total span is not an exact multiple of
    // the new width.
    let tseg = x[n - 1] - x[0] + dx_old;
    let mut ybin = ybin;
    if (tseg / dx_new).fract() > 0.0 && !ybin.is_empty() {
        ybin.pop();
    }

    let xbin: Vec<f64> = (0..ybin.len())
        .map(|k| k as f64 * dx_new + x[0] - dx_old + dx_new)
        .collect();

    Ok((xbin, ybin, step_size))
}

/// Largest bin time not exceeding `t_bin` that gives a power-of-two number of
/// bins over an FFT segment of length `fft_length`.
pub fn optimal_bin_time(fft_length: f64, t_bin: f64) -> f64 {
    fft_length / 2f64.powf((fft_length / t_bin).log2().ceil())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebin_sum_pairs() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        let (xbin, ybin, step) = rebin_data(&x, &y, 2.0, "sum").unwrap();
        assert_eq!(ybin, vec![2.0, 2.0]);
        assert_eq!(xbin, vec![1.0, 3.0]);
        assert!((step - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rebin_mean() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let (_, ybin, _) = rebin_data(&x, &y, 2.0, "mean").unwrap();
        assert_eq!(ybin, vec![2.0, 6.0]);

        let (_, ybin_avg, _) = rebin_data(&x, &y, 2.0, "arithmetic mean").unwrap();
        assert_eq!(ybin, ybin_avg);
    }

    #[test]
    fn test_rebin_fractional_step() {
        // Step 1.5: boundary samples are split between neighbors.
        let x = [0.0, 1.0, 2.0];
        let y = [2.0, 2.0, 2.0];
        let (_, ybin, step) = rebin_data(&x, &y, 1.5, "sum").unwrap();
        assert!((step - 1.5).abs() < 1e-12);
        assert_eq!(ybin, vec![3.0, 3.0]);
    }

    #[test]
    fn test_rebin_drops_trailing_partial_bin() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 1.0, 1.0, 1.0, 1.0];
        // Span 5 over bins of 2: the last, half-covered bin is dropped.
        let (_, ybin, _) = rebin_data(&x, &y, 2.0, "sum").unwrap();
        assert_eq!(ybin, vec![2.0, 2.0]);
    }

    #[test]
    fn test_rebin_rejects_unknown_method() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        let err = rebin_data(&x, &y, 2.0, "median").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedMethod(_)));
    }

    #[test]
    fn test_rebin_rejects_finer_resolution() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        let err = rebin_data(&x, &y, 0.5, "sum").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_optimal_bin_time() {
        // 512 s segment, proposed 1.1 s bins: 512/1.1 = 465.5, next power of
        // two is 512, so the optimal bin time is exactly 1 s.
        assert!((optimal_bin_time(512.0, 1.1) - 1.0).abs() < 1e-12);
    }
}
