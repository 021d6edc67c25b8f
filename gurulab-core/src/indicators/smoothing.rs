//! Moving-window and exponential smoothing primitives.
//!
//! `ewm_mean` follows the adjusted exponentially weighted mean used by most
//! dataframe libraries: the estimate at t is the weighted average of all
//! observations so far with weights (1 - alpha)^k, so early values are not
//! biased toward the first observation. NaN inputs still decay the weights.

/// Adjusted exponentially weighted mean.
///
/// Output is NaN until `min_periods` non-NaN observations have been seen.
pub fn ewm_mean(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let min_periods = min_periods.max(1);
    let decay = 1.0 - alpha;
    let mut out = Vec::with_capacity(values.len());

    let mut weighted = f64::NAN;
    let mut old_wt = 1.0;
    let mut nobs = 0usize;

    for &cur in values {
        let is_obs = !cur.is_nan();
        if is_obs {
            nobs += 1;
        }
        if !weighted.is_nan() {
            old_wt *= decay;
            if is_obs {
                if weighted != cur {
                    weighted = (old_wt * weighted + cur) / (old_wt + 1.0);
                }
                old_wt += 1.0;
            }
        } else if is_obs {
            weighted = cur;
        }
        out.push(if nobs >= min_periods { weighted } else { f64::NAN });
    }
    out
}

/// EWM with alpha = 2 / (span + 1) and `min_periods = span`.
pub fn ewm_span(values: &[f64], span: usize) -> Vec<f64> {
    ewm_mean(values, 2.0 / (span as f64 + 1.0), span)
}

/// Trailing mean over `window` values; NaN if the window is short or holds a NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let ss: f64 = w.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (w.len() - 1) as f64).sqrt()
    })
}

fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let w = &values[i + 1 - window..=i];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(w);
    }
    out
}
