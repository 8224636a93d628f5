use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{errors::LapDeltaError, telemetry::TelemetryTrace};

/// Thresholds for detecting corners as localized speed drops
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerDetectionConfig {
    /// Minimum drop in km/h between the mean speed before and after a sample
    pub min_speed_drop: f64,
    /// Number of samples averaged on each side
    pub window: usize,
    /// Minimum number of samples between two reported corners
    pub min_spacing: usize,
}

impl CornerDetectionConfig {
    /// Only heavy braking zones
    pub const COARSE: Self = Self {
        min_speed_drop: 18.0,
        window: 6,
        min_spacing: 25,
    };

    /// Catches lifts and light braking too, used for the corner table
    pub const SENSITIVE: Self = Self {
        min_speed_drop: 8.0,
        window: 7,
        min_spacing: 15,
    };
}

impl Default for CornerDetectionConfig {
    fn default() -> Self {
        Self::COARSE
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CornerPreset {
    Coarse,
    #[default]
    Sensitive,
}

impl CornerPreset {
    pub fn config(&self) -> CornerDetectionConfig {
        match self {
            CornerPreset::Coarse => CornerDetectionConfig::COARSE,
            CornerPreset::Sensitive => CornerDetectionConfig::SENSITIVE,
        }
    }
}

/// A detected corner: index into the lap's samples and the distance there
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerEvent {
    pub index: usize,
    pub distance: f64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Scan a speed trace (km/h) for deceleration events.
///
/// A sample is a candidate when the mean speed over the `window` samples
/// before it exceeds the mean over the `window` samples starting at it by more
/// than `min_speed_drop`. Candidates are then thinned left to right: one is
/// kept only if it lies more than `min_spacing` samples after the last kept
/// one.
pub fn detect_corners(speed: &[f64], config: &CornerDetectionConfig) -> Vec<usize> {
    let window = config.window;
    if window == 0 || speed.len() <= 2 * window {
        return Vec::new();
    }

    let candidates = (window..speed.len() - window).filter(|&i| {
        let before = mean(&speed[i - window..i]);
        let after = mean(&speed[i..i + window]);
        before - after > config.min_speed_drop
    });

    let mut corners: Vec<usize> = Vec::new();
    for idx in candidates {
        if corners
            .last()
            .is_none_or(|&last| idx - last > config.min_spacing)
        {
            corners.push(idx);
        }
    }
    corners
}

/// Detect corners on a lap and pair each with the lap distance at that sample
///
/// # Errors
///
/// Returns [`LapDeltaError::MissingChannel`] if the lap has no speed or
/// distance channel.
pub fn detect_corner_events(
    trace: &TelemetryTrace,
    config: &CornerDetectionConfig,
) -> Result<Vec<CornerEvent>, LapDeltaError> {
    let speed = trace.speed()?;
    let distance = trace.distance()?;
    Ok(detect_corners(speed, config)
        .into_iter()
        .filter_map(|index| {
            distance
                .get(index)
                .map(|&distance| CornerEvent { index, distance })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Flat 200 km/h with a step down to 170 km/h at `drop_at`
    fn single_drop(len: usize, drop_at: usize) -> Vec<f64> {
        (0..len)
            .map(|i| if i < drop_at { 200. } else { 170. })
            .collect()
    }

    #[test]
    fn test_single_drop_gives_one_corner() {
        let speed = single_drop(100, 50);
        let corners = detect_corners(&speed, &CornerDetectionConfig::COARSE);
        assert_eq!(corners.len(), 1);
        let idx = corners[0];
        assert!(idx.abs_diff(50) <= CornerDetectionConfig::COARSE.window, "corner at {}", idx);
    }

    #[test]
    fn test_flat_trace_has_no_corners() {
        let speed = vec![250.; 200];
        assert!(detect_corners(&speed, &CornerDetectionConfig::SENSITIVE).is_empty());
    }

    #[test]
    fn test_acceleration_is_not_a_corner() {
        let speed: Vec<f64> = (0..100).map(|i| if i < 50 { 100. } else { 250. }).collect();
        assert!(detect_corners(&speed, &CornerDetectionConfig::COARSE).is_empty());
    }

    #[test]
    fn test_spacing_suppresses_clusters() {
        // two drops 10 samples apart collapse into one with spacing 25
        let speed: Vec<f64> = (0..120)
            .map(|i| match i {
                0..40 => 250.,
                40..50 => 200.,
                _ => 150.,
            })
            .collect();
        let corners = detect_corners(&speed, &CornerDetectionConfig::COARSE);
        assert_eq!(corners.len(), 1);

        let spread = CornerDetectionConfig {
            min_spacing: 2,
            ..CornerDetectionConfig::COARSE
        };
        assert!(detect_corners(&speed, &spread).len() >= 2);
    }

    #[test]
    fn test_short_trace_and_zero_window() {
        let speed = single_drop(10, 5);
        assert!(detect_corners(&speed, &CornerDetectionConfig::COARSE).is_empty());

        let zero_window = CornerDetectionConfig {
            window: 0,
            ..CornerDetectionConfig::COARSE
        };
        assert!(detect_corners(&single_drop(100, 50), &zero_window).is_empty());
    }

    #[test]
    fn test_corner_events_carry_distance() {
        let speed = single_drop(100, 50);
        let distance: Vec<f64> = (0..100).map(|i| i as f64 * 5.).collect();
        let trace = TelemetryTrace::new(distance, speed);
        let events = detect_corner_events(&trace, &CornerDetectionConfig::COARSE).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].distance, events[0].index as f64 * 5.);
    }

    #[test]
    fn test_presets() {
        assert_eq!(CornerPreset::Coarse.config(), CornerDetectionConfig::COARSE);
        assert_eq!(CornerPreset::Sensitive.config().window, 7);
        assert_eq!(CornerDetectionConfig::default(), CornerDetectionConfig::COARSE);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_corners_respect_spacing(
            speed in prop::collection::vec(50.0f64..330.0, 0..400),
            window in 1usize..10,
            min_spacing in 0usize..30,
            min_speed_drop in 0.0f64..40.0,
        ) {
            let config = CornerDetectionConfig { min_speed_drop, window, min_spacing };
            let corners = detect_corners(&speed, &config);
            prop_assert!(corners.windows(2).all(|w| w[1] - w[0] > min_spacing));
            prop_assert!(corners.iter().all(|&i| i >= window && i + window <= speed.len()));
        }

        #[test]
        fn prop_higher_threshold_never_adds_corners(
            speed in prop::collection::vec(50.0f64..330.0, 0..400),
            low in 0.0f64..30.0,
            extra in 0.0f64..30.0,
        ) {
            let loose = CornerDetectionConfig { min_speed_drop: low, ..CornerDetectionConfig::SENSITIVE };
            let strict = CornerDetectionConfig { min_speed_drop: low + extra, ..CornerDetectionConfig::SENSITIVE };
            prop_assert!(detect_corners(&speed, &strict).len() <= detect_corners(&speed, &loose).len());
        }
    }
}
