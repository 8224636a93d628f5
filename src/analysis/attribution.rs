use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use super::delta::DeltaSeries;
use crate::telemetry::{PositionTrace, TelemetryTrace};

/// Number of delta samples read on each side of a corner
const CORNER_HALF_WINDOW: usize = 5;

/// Time swing through one corner
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CornerDeltaRecord {
    /// Corner label, `T1`, `T2`, ... in detection order
    pub corner: String,
    /// Lap distance of the corner on lap A
    pub distance: f64,
    /// Change of the delta across the corner. Negative means driver B gained.
    pub delta_change: f64,
    /// Driver who gained time through the corner
    pub gained_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SkipReason {
    /// The corner index is past the end of lap A
    IndexOutOfRange,
    /// Lap A has no distance channel
    MissingDistance,
    /// The delta series has no samples
    EmptyDeltaSeries,
}

/// Outcome of mapping one detected corner onto the delta series
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum CornerMapping {
    Mapped {
        index: usize,
        record: CornerDeltaRecord,
    },
    Skipped {
        corner: String,
        index: usize,
        reason: SkipReason,
    },
}

impl CornerMapping {
    pub fn record(&self) -> Option<&CornerDeltaRecord> {
        match self {
            CornerMapping::Mapped { record, .. } => Some(record),
            CornerMapping::Skipped { .. } => None,
        }
    }
}

/// Index of the axis sample closest to `distance`, first one on ties
fn nearest_index(axis: &[f64], distance: f64) -> Option<usize> {
    axis.iter()
        .position_min_by(|a, b| (*a - distance).abs().total_cmp(&(*b - distance).abs()))
}

fn map_corner(
    label: String,
    index: usize,
    lap_a_distance: Option<&[f64]>,
    series: &DeltaSeries,
    driver_a: &str,
    driver_b: &str,
) -> CornerMapping {
    let skip = |reason| CornerMapping::Skipped {
        corner: label.clone(),
        index,
        reason,
    };

    let Some(lap_a_distance) = lap_a_distance else {
        return skip(SkipReason::MissingDistance);
    };
    let Some(&distance) = lap_a_distance.get(index) else {
        return skip(SkipReason::IndexOutOfRange);
    };
    let n = series.delta.len().min(series.distance.len());
    let Some(nearest) = nearest_index(&series.distance[..n], distance) else {
        return skip(SkipReason::EmptyDeltaSeries);
    };

    let delta_before = series.delta[nearest.saturating_sub(CORNER_HALF_WINDOW)];
    let delta_after = series.delta[(nearest + CORNER_HALF_WINDOW).min(n - 1)];
    let delta_change = delta_after - delta_before;
    let gained_by = if delta_change < 0.0 { driver_b } else { driver_a };

    CornerMapping::Mapped {
        index,
        record: CornerDeltaRecord {
            corner: label,
            distance,
            delta_change,
            gained_by: gained_by.to_string(),
        },
    }
}

/// Map corners detected on lap A onto the delta series.
///
/// Corners are labelled `T1..Tn` in the order given, skipped corners keep
/// their number. One entry is returned per corner.
pub fn map_corners(
    corner_indices: &[usize],
    lap_a: &TelemetryTrace,
    series: &DeltaSeries,
    driver_a: &str,
    driver_b: &str,
) -> Vec<CornerMapping> {
    let lap_a_distance = lap_a.distance().ok();
    corner_indices
        .iter()
        .enumerate()
        .map(|(i, &index)| {
            let mapping = map_corner(
                format!("T{}", i + 1),
                index,
                lap_a_distance,
                series,
                driver_a,
                driver_b,
            );
            if let CornerMapping::Skipped { corner, reason, .. } = &mapping {
                debug!("Skipping corner {}: {:?}", corner, reason);
            }
            mapping
        })
        .collect()
}

/// Corner table: only the corners that could be mapped
pub fn attribute_corner_deltas(
    corner_indices: &[usize],
    lap_a: &TelemetryTrace,
    series: &DeltaSeries,
    driver_a: &str,
    driver_b: &str,
) -> Vec<CornerDeltaRecord> {
    map_corners(corner_indices, lap_a, series, driver_a, driver_b)
        .into_iter()
        .filter_map(|m| match m {
            CornerMapping::Mapped { record, .. } => Some(record),
            CornerMapping::Skipped { .. } => None,
        })
        .collect()
}

/// A mapped corner placed on the track map
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CornerMarker {
    pub corner: String,
    pub x: f64,
    pub y: f64,
    pub delta_change: f64,
}

/// Place mapped corners on lap A's racing line.
///
/// Car data and position data are sampled independently, so the position
/// sample is the one closest in time to the car sample at the corner. Corners
/// without a time or position are left out.
pub fn locate_corner_markers(
    mappings: &[CornerMapping],
    lap_a: &TelemetryTrace,
    positions: &PositionTrace,
) -> Vec<CornerMarker> {
    let Some(car_time) = lap_a.time() else {
        debug!("Lap has no time channel, corner markers cannot be placed");
        return Vec::new();
    };

    mappings
        .iter()
        .filter_map(|mapping| {
            let CornerMapping::Mapped { index, record } = mapping else {
                return None;
            };
            let time = *car_time.get(*index)?;
            let pos = nearest_index(&positions.time, time)?;
            Some(CornerMarker {
                corner: record.corner.clone(),
                x: *positions.x.get(pos)?,
                y: *positions.y.get(pos)?,
                delta_change: record.delta_change,
            })
        })
        .collect()
}
