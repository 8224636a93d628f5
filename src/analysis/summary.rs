use serde::{Deserialize, Serialize};

use super::{attribution::CornerDeltaRecord, sectors::SectorMap};

/// Key facts of a lap comparison, for the presentation layer to phrase
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComparisonSummary {
    /// Delta at the end of the lap, positive when driver B was slower
    pub final_delta: f64,
    pub faster_driver: String,
    /// Seconds the faster driver was ahead by at the end of the lap
    pub margin_s: f64,
    /// Sector where the faster driver gained the most, if they gained anywhere
    pub strongest_sector: Option<String>,
    /// Corner with the largest time swing in either direction
    pub biggest_corner: Option<CornerDeltaRecord>,
}

pub fn summarize(
    driver_a: &str,
    driver_b: &str,
    final_delta: f64,
    sectors: &SectorMap,
    corners: &[CornerDeltaRecord],
) -> ComparisonSummary {
    let b_faster = final_delta < 0.0;
    let faster_driver = if b_faster { driver_b } else { driver_a };

    // time gained by the faster driver in each sector, sectors they lost are ignored
    let strongest_sector = sectors
        .iter()
        .filter_map(|s| {
            let gain = if b_faster { -s.delta } else { s.delta };
            (gain > 0.0).then_some((gain, s))
        })
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, s)| s.sector.clone());

    let biggest_corner = corners
        .iter()
        .max_by(|a, b| a.delta_change.abs().total_cmp(&b.delta_change.abs()))
        .cloned();

    ComparisonSummary {
        final_delta,
        faster_driver: faster_driver.to_string(),
        margin_s: final_delta.abs(),
        strongest_sector,
        biggest_corner,
    }
}
