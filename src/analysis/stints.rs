use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::telemetry::{LapRecord, TyreCompound};

/// A contiguous run of laps on one tyre compound
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TyreStint {
    pub compound: TyreCompound,
    pub start_lap: u32,
    pub end_lap: u32,
    /// `end_lap - start_lap + 1`
    pub length: u32,
}

/// Run-length encode the compound over laps in lap order.
///
/// A new stint starts whenever the compound differs from the previous lap.
/// Laps without a compound count as `UNKNOWN` and group together.
pub fn extract_stints<'a>(laps: impl IntoIterator<Item = &'a LapRecord>) -> Vec<TyreStint> {
    let runs = laps.into_iter().chunk_by(|lap| lap.compound());
    runs.into_iter()
        .filter_map(|(compound, mut run)| {
            let first = run.next()?;
            let last = run.last().unwrap_or(first);
            Some(TyreStint {
                compound,
                start_lap: first.lap_number,
                end_lap: last.lap_number,
                length: last.lap_number.saturating_sub(first.lap_number) + 1,
            })
        })
        .collect()
}

/// Stints of one driver over a whole session.
///
/// Only valid laps are considered (timed, no pit entry or exit), sorted by
/// lap number first.
pub fn stints_for_driver(laps: &[LapRecord], driver: &str) -> Vec<TyreStint> {
    extract_stints(
        laps.iter()
            .filter(|l| l.driver == driver && l.is_valid())
            .sorted_by_key(|l| l.lap_number),
    )
}
