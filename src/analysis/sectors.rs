use serde::{Deserialize, Serialize};

/// Labels of the three equal-length distance bands, in track order
pub const SECTOR_LABELS: [&str; 3] = ["Sector 1", "Sector 2", "Sector 3"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SectorDelta {
    pub sector: String,
    /// Time lost (positive) or gained (negative) by lap B within the sector
    pub delta: f64,
}

/// Delta time of lap B reduced to one value per sector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SectorMap {
    sectors: Vec<SectorDelta>,
}

impl SectorMap {
    fn from_deltas(deltas: [f64; 3]) -> Self {
        Self {
            sectors: SECTOR_LABELS
                .iter()
                .zip(deltas)
                .map(|(label, delta)| SectorDelta {
                    sector: label.to_string(),
                    delta,
                })
                .collect(),
        }
    }

    pub fn get(&self, sector: &str) -> Option<f64> {
        self.sectors
            .iter()
            .find(|s| s.sector == sector)
            .map(|s| s.delta)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectorDelta> {
        self.sectors.iter()
    }

    /// Sum of all sectors, equal to the final delta of the series
    pub fn total(&self) -> f64 {
        self.sectors.iter().map(|s| s.delta).sum()
    }
}

/// First index where `distance` reaches `boundary`, or the last index when it
/// never does. The axis is not assumed to be sorted: laps that do not overlap
/// produce a decreasing one.
fn boundary_index(distance: &[f64], boundary: f64) -> usize {
    distance
        .iter()
        .position(|&d| d >= boundary)
        .unwrap_or(distance.len() - 1)
}

/// Split a delta series into three equal-length sectors.
///
/// Each sector value is the change of `delta` across that sector, so the three
/// values add up to the last element of `delta`. Empty input yields zeros.
pub fn compute_sector_deltas(distance: &[f64], delta: &[f64]) -> SectorMap {
    let n = distance.len().min(delta.len());
    if n == 0 {
        return SectorMap::from_deltas([0.0; 3]);
    }
    let distance = &distance[..n];

    let total_distance = distance.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let s1_idx = boundary_index(distance, total_distance / 3.0);
    let s2_idx = boundary_index(distance, 2.0 * total_distance / 3.0);
    let last = n - 1;

    SectorMap::from_deltas([
        delta[s1_idx],
        delta[s2_idx] - delta[s1_idx],
        delta[last] - delta[s2_idx],
    ])
}
