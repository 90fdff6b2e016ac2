//! Timestamp post-processing for decoded XDF streams
//!
//! - [`synchronize_clocks`]: map each stream's timestamps onto the recording
//!   computer's clock using the clock offsets stored in the file
//! - [`dejitter_timestamps`]: replace the timestamps of regular streams by a
//!   linear fit per contiguous segment

use crate::xdf::{ClockOffset, XdfStream};

/// Gaps longer than this many seconds start a new dejitter segment
pub const MAX_BREAK_SECONDS: f64 = 1.0;

/// Gaps longer than this many sample intervals start a new dejitter segment
pub const MAX_BREAK_SAMPLES: f64 = 500.0;

/// Least-squares fit of `y = intercept + slope * x`.
///
/// Degenerate inputs (a single point, constant `x`) fall back to a constant
/// model through the mean of `y`.
fn linear_fit(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    if xs.is_empty() {
        return (0.0, 0.0);
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    if sxx == 0.0 {
        return (mean_y, 0.0);
    }
    let slope = sxy / sxx;
    (mean_y - slope * mean_x, slope)
}

/// Fit the clock offset model of a stream, `offset(t) = a + b * t`
pub fn fit_clock_offsets(offsets: &[ClockOffset]) -> Option<(f64, f64)> {
    if offsets.is_empty() {
        return None;
    }
    let times: Vec<f64> = offsets.iter().map(|o| o.collection_time).collect();
    let values: Vec<f64> = offsets.iter().map(|o| o.offset).collect();
    Some(linear_fit(&times, &values))
}

/// Apply the fitted clock offset model to the stream's timestamps.
///
/// Streams without clock offsets are left untouched. Returns whether the
/// timestamps were changed.
pub fn synchronize_clocks(stream: &mut XdfStream) -> bool {
    let Some((intercept, slope)) = fit_clock_offsets(&stream.clock_offsets) else {
        return false;
    };

    for ts in stream.time_stamps.iter_mut() {
        *ts += intercept + slope * *ts;
    }
    tracing::debug!(
        "Stream {}: clock offset model {:.6} + {:.9} * t applied to {} samples",
        stream.stream_id,
        intercept,
        slope,
        stream.time_stamps.len()
    );
    true
}

/// Split timestamps into contiguous segments (inclusive index ranges)
pub fn segment_boundaries(time_stamps: &[f64], nominal_srate: f64) -> Vec<(usize, usize)> {
    if time_stamps.is_empty() {
        return Vec::new();
    }
    let threshold = if nominal_srate > 0.0 {
        MAX_BREAK_SECONDS.max(MAX_BREAK_SAMPLES / nominal_srate)
    } else {
        MAX_BREAK_SECONDS
    };

    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..time_stamps.len() {
        let step = time_stamps[i] - time_stamps[i - 1];
        if step > threshold || step < 0.0 {
            segments.push((start, i - 1));
            start = i;
        }
    }
    segments.push((start, time_stamps.len() - 1));
    segments
}

/// Replace the timestamps of a regular stream by a per-segment linear fit.
///
/// Irregular streams (`nominal_srate == 0`) are left untouched. Returns
/// whether the timestamps were changed.
pub fn dejitter_timestamps(stream: &mut XdfStream) -> bool {
    if stream.info.is_irregular() || stream.time_stamps.len() < 2 {
        return false;
    }

    let segments = segment_boundaries(&stream.time_stamps, stream.info.nominal_srate);
    for &(start, stop) in &segments {
        if stop <= start {
            continue;
        }
        let indices: Vec<f64> = (0..=stop - start).map(|i| i as f64).collect();
        let (intercept, slope) = linear_fit(&indices, &stream.time_stamps[start..=stop]);
        for (i, ts) in stream.time_stamps[start..=stop].iter_mut().enumerate() {
            *ts = intercept + slope * i as f64;
        }
    }
    tracing::debug!(
        "Stream {}: dejittered {} samples in {} segment(s)",
        stream.stream_id,
        stream.time_stamps.len(),
        segments.len()
    );
    true
}
