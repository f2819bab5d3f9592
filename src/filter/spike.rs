use log::debug;

use super::savgol::SavitzkyGolay;
use crate::config::SpikeFilterParams;
use crate::error::FilterError;

/// Replace narrow positive outliers (cosmic-ray hits) in `data`.
///
/// The baseline is a Savitzky-Golay pass of order `polyorder1` smoothed again
/// with order `polyorder2`. Wherever a sample exceeds the baseline by more
/// than `threshold`, the spike is bracketed:
///
/// * start: walking back from the previous sample, the first one not above
///   the baseline;
/// * end: walking forward up to `max_spike_width` samples, the first one
///   below the baseline, else `i + max_spike_width` clamped to the last index.
///
/// Samples strictly inside the bracket are replaced by the straight line
/// through the bracket endpoints, and scanning continues after `end`.
/// Endpoints are always read from `data`; the result is a new vector.
///
/// A spike with no baseline crossing before it fails with
/// [`FilterError::InsufficientLeadingContext`].
pub fn filter_spikes(data: &[f64], params: &SpikeFilterParams) -> Result<Vec<f64>, FilterError> {
    params.validate()?;
    if data.len() < params.window_length {
        return Err(FilterError::WindowTooLong {
            window_length: params.window_length,
            len: data.len(),
        });
    }

    let smooth = SavitzkyGolay::new(params.window_length, params.polyorder1)?.apply(data)?;
    let baseline = SavitzkyGolay::new(params.window_length, params.polyorder2)?.apply(&smooth)?;

    let n = data.len();
    let mut cleaned = data.to_vec();
    let mut i = 0;
    while i < n {
        if data[i] - baseline[i] > params.threshold {
            let start = leading_edge(data, &baseline, i)?;
            let end = trailing_edge(data, &baseline, i, params.max_spike_width);

            let slope = (data[end] - data[start]) / (end - start) as f64;
            let intercept = data[start] - slope * start as f64;
            for (j, slot) in cleaned.iter_mut().enumerate().take(end).skip(start + 1) {
                *slot = slope * j as f64 + intercept;
            }
            debug!(
                "spike at {i} ({:.1} over baseline) replaced over {start}..={end}",
                data[i] - baseline[i]
            );
            i = end;
        }
        i += 1;
    }
    Ok(cleaned)
}

fn leading_edge(data: &[f64], baseline: &[f64], i: usize) -> Result<usize, FilterError> {
    let mut start = i
        .checked_sub(1)
        .ok_or(FilterError::InsufficientLeadingContext { index: i })?;
    while data[start] > baseline[start] {
        start = start
            .checked_sub(1)
            .ok_or(FilterError::InsufficientLeadingContext { index: i })?;
    }
    Ok(start)
}

fn trailing_edge(data: &[f64], baseline: &[f64], i: usize, max_spike_width: usize) -> usize {
    let n = data.len();
    (1..max_spike_width)
        .take_while(|j| i + j < n)
        .find(|j| data[i + j] < baseline[i + j])
        .map_or_else(|| i.saturating_add(max_spike_width).min(n - 1), |j| i + j)
}
