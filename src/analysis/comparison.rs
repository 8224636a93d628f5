use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    attribution::{CornerDeltaRecord, CornerMarker, locate_corner_markers, map_corners},
    corners::detect_corners,
    delta::{DeltaSeries, compute_delta_time},
    overlay::{ChannelOverlay, overlay_channels},
    sectors::{SectorMap, compute_sector_deltas},
    summary::{ComparisonSummary, summarize},
};
use crate::{
    config::AnalysisConfig,
    errors::LapDeltaError,
    telemetry::{LapRecord, LapTelemetry},
};

/// Everything the presentation layer needs to show one lap against another
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LapComparison {
    pub driver_a: String,
    pub driver_b: String,
    /// Timing rows of the compared laps, with compound, team and driver name
    pub lap_a: LapRecord,
    pub lap_b: LapRecord,
    pub delta: DeltaSeries,
    /// Speed and pedal traces of both laps on the delta's distance axis
    pub overlays: Vec<ChannelOverlay>,
    pub sectors: SectorMap,
    pub corners: Vec<CornerDeltaRecord>,
    pub markers: Vec<CornerMarker>,
    pub summary: ComparisonSummary,
}

/// Compare lap B against lap A.
///
/// Corners are detected on lap A and their time swing is read from the delta
/// of lap B relative to lap A.
///
/// # Errors
///
/// Returns [`LapDeltaError::MissingChannel`] if either lap lacks distance or
/// speed data.
pub fn compare_laps(
    lap_a: &LapTelemetry,
    lap_b: &LapTelemetry,
    config: &AnalysisConfig,
) -> Result<LapComparison, LapDeltaError> {
    let driver_a = lap_a.lap.driver.as_str();
    let driver_b = lap_b.lap.driver.as_str();
    info!(
        "Comparing {} lap {} against {} lap {}",
        driver_b, lap_b.lap.lap_number, driver_a, lap_a.lap.lap_number
    );

    let delta = compute_delta_time(&lap_a.car, &lap_b.car, config.n_points)?;
    let sectors = compute_sector_deltas(&delta.distance, &delta.delta);
    let overlays = overlay_channels(&lap_a.car, &lap_b.car, &delta.distance);

    let corner_indices = detect_corners(lap_a.car.speed()?, &config.corner_detection());
    let mappings = map_corners(&corner_indices, &lap_a.car, &delta, driver_a, driver_b);
    let markers = locate_corner_markers(&mappings, &lap_a.car, &lap_a.position);
    let corners: Vec<CornerDeltaRecord> = mappings
        .iter()
        .filter_map(|m| m.record())
        .cloned()
        .collect();
    debug!(
        "Detected {} corners, {} mapped onto the delta",
        corner_indices.len(),
        corners.len()
    );

    let summary = summarize(
        driver_a,
        driver_b,
        delta.final_delta().unwrap_or(0.0),
        &sectors,
        &corners,
    );

    Ok(LapComparison {
        driver_a: driver_a.to_string(),
        driver_b: driver_b.to_string(),
        lap_a: lap_a.lap.clone(),
        lap_b: lap_b.lap.clone(),
        delta,
        overlays,
        sectors,
        corners,
        markers,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{LapRecord, TelemetryTrace};

    fn lap(driver: &str, speed: impl Fn(f64) -> f64) -> LapTelemetry {
        let distance: Vec<f64> = (0..500).map(|i| i as f64 * 10.).collect();
        let speed = distance.iter().map(|&d| speed(d)).collect();
        LapTelemetry {
            lap: LapRecord {
                driver: driver.to_string(),
                lap_number: 1,
                ..Default::default()
            },
            car: TelemetryTrace::new(distance, speed),
            ..Default::default()
        }
    }

    /// Two heavy braking zones, at 1500m and 3500m
    fn braking_profile(d: f64) -> f64 {
        if (1500.0..1800.0).contains(&d) || (3500.0..3800.0).contains(&d) {
            90.
        } else {
            280.
        }
    }

    #[test]
    fn test_identical_laps() {
        let a = lap("VER", braking_profile);
        let comparison = compare_laps(&a, &a.clone(), &AnalysisConfig::default()).unwrap();

        assert!(comparison.delta.delta.iter().all(|&d| d == 0.));
        assert!(comparison.sectors.iter().all(|s| s.delta == 0.));
        assert_eq!(comparison.corners.len(), 2);
        assert!(comparison.corners.iter().all(|c| c.delta_change == 0.));
        assert_eq!(comparison.summary.faster_driver, "VER");
        // no pedal data on these laps
        assert_eq!(comparison.overlays.len(), 1);
        assert_eq!(comparison.overlays[0].lap_a, comparison.overlays[0].lap_b);
    }

    #[test]
    fn test_slower_braking_zone_is_attributed() {
        let a = lap("VER", braking_profile);
        // B brakes early and carries less speed into the second zone only
        let b = lap("PER", |d| {
            if (3400.0..3800.0).contains(&d) {
                70.
            } else {
                braking_profile(d)
            }
        });
        let comparison = compare_laps(&a, &b, &AnalysisConfig::default()).unwrap();

        assert!(comparison.summary.final_delta > 0.);
        assert_eq!(comparison.summary.faster_driver, "VER");
        assert_eq!(comparison.summary.strongest_sector.as_deref(), Some("Sector 3"));
        let first = &comparison.corners[0];
        let second = &comparison.corners[1];
        assert_eq!(first.delta_change, 0.);
        assert!(second.delta_change > 0.);
        assert_eq!(second.gained_by, "VER");
        assert!(comparison.markers.is_empty());
        assert_eq!(comparison.lap_a.driver, "VER");
        assert_eq!(comparison.lap_b.driver, "PER");
    }

    #[test]
    fn test_disjoint_laps_split_sectors_on_first_reaching_index() {
        let mut a = lap("VER", |_| 250.);
        a.car = TelemetryTrace::new(
            (0..=10).map(|i| 1000. + i as f64 * 100.).collect(),
            vec![250.; 11],
        );
        let mut b = lap("PER", |_| 200.);
        b.car = TelemetryTrace::new((0..=3).map(|i| i as f64 * 100.).collect(), vec![200.; 4]);

        let comparison = compare_laps(&a, &b, &AnalysisConfig::default()).unwrap();
        let axis = &comparison.delta.distance;
        assert_eq!(axis[0], 1000.);
        assert_eq!(axis[axis.len() - 1], 300.);

        // both boundaries are reached at the first sample of the axis
        let delta = &comparison.delta.delta;
        assert_eq!(comparison.sectors.get("Sector 1"), Some(delta[0]));
        assert_eq!(comparison.sectors.get("Sector 2"), Some(0.));
        assert!((comparison.sectors.total() - delta[delta.len() - 1]).abs() < 1e-9);
    }

    #[test]
    fn test_missing_speed_is_fatal() {
        let a = lap("VER", braking_profile);
        let mut b = a.clone();
        b.car = TelemetryTrace::new(vec![0., 10.], vec![]);
        assert!(matches!(
            compare_laps(&a, &b, &AnalysisConfig::default()),
            Err(LapDeltaError::MissingChannel { .. })
        ));
    }
}
