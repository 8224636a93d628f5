use serde::{Deserialize, Serialize};
use uom::si::{
    f64::Velocity,
    velocity::{kilometer_per_hour, meter_per_second},
};

use crate::{errors::LapDeltaError, telemetry::TelemetryTrace};

/// Default resampling resolution of the shared distance axis
pub const DEFAULT_N_POINTS: usize = 1000;

/// Cumulative time difference between two laps over a shared distance axis.
///
/// `delta[i]` is the time in seconds by which lap B is behind (positive) or
/// ahead (negative) of lap A at `distance[i]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DeltaSeries {
    pub distance: Vec<f64>,
    pub delta: Vec<f64>,
}

impl DeltaSeries {
    pub fn len(&self) -> usize {
        self.delta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Delta at the end of the overlap, i.e. the lap time difference
    pub fn final_delta(&self) -> Option<f64> {
        self.delta.last().copied()
    }
}

/// `n` evenly spaced values over `[start, stop]`, both ends included
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Piecewise linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be non-decreasing. Values outside the sampled range are clamped
/// to the first/last sample.
pub(crate) fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    if x < xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // right-most sample at or before x, so repeated distances resolve to the later sample
    let j = xp[..n].partition_point(|&v| v <= x) - 1;
    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    fp[j] + slope * (x - xp[j])
}

fn kph_to_mps(speed_kph: f64) -> f64 {
    Velocity::new::<kilometer_per_hour>(speed_kph).get::<meter_per_second>()
}

/// Running sum that skips NaN steps: an undefined step carries the previous
/// total forward instead of poisoning everything after it
pub(crate) fn nan_cumsum(steps: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut total = 0.0;
    steps
        .into_iter()
        .map(|step| {
            if !step.is_nan() {
                total += step;
            }
            total
        })
        .collect()
}

fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Elapsed time at each point of `axis` for a lap driven at `speed_kph`
fn cumulative_time(axis: &[f64], segment: f64, distance: &[f64], speed_kph: &[f64]) -> Vec<f64> {
    nan_cumsum(axis.iter().map(|&d| {
        let speed = kph_to_mps(interp(d, distance, speed_kph));
        if speed > 0.0 { segment / speed } else { f64::NAN }
    }))
}

/// Compute the delta time of lap B relative to lap A.
///
/// Both speed traces are resampled onto `n_points` evenly spaced distances
/// covering the overlap of the two laps, and the time needed to cover each
/// step is integrated. Steps where the interpolated speed is not positive do
/// not contribute.
///
/// When the laps do not overlap the returned axis is degenerate (constant or
/// decreasing); it still has `n_points` entries.
///
/// # Errors
///
/// Returns [`LapDeltaError::MissingChannel`] if either trace lacks the
/// `Distance` or `Speed` channel.
pub fn compute_delta_time(
    trace_a: &TelemetryTrace,
    trace_b: &TelemetryTrace,
    n_points: usize,
) -> Result<DeltaSeries, LapDeltaError> {
    let distance_a = trace_a.distance()?;
    let distance_b = trace_b.distance()?;
    let speed_a = trace_a.speed()?;
    let speed_b = trace_b.speed()?;

    let (min_a, max_a) = extent(distance_a);
    let (min_b, max_b) = extent(distance_b);
    let distance = linspace(min_a.max(min_b), max_a.min(max_b), n_points);

    let segment = match distance.as_slice() {
        [first, second, ..] => second - first,
        _ => 0.0,
    };

    let time_a = cumulative_time(&distance, segment, distance_a, speed_a);
    let time_b = cumulative_time(&distance, segment, distance_b, speed_b);
    let delta = time_b.iter().zip(&time_a).map(|(b, a)| b - a).collect();

    Ok(DeltaSeries { distance, delta })
}
