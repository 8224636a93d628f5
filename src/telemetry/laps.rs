use itertools::Itertools;

use super::LapRecord;

/// Valid laps of `driver`, fastest first. In-laps, out-laps and untimed laps
/// are left out.
pub fn valid_laps<'a>(laps: &'a [LapRecord], driver: &str) -> Vec<&'a LapRecord> {
    laps.iter()
        .filter(|l| l.driver == driver && l.is_valid())
        .filter_map(|l| l.lap_time_s.map(|t| (t, l)))
        .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, l)| l)
        .collect()
}

pub fn fastest_lap<'a>(laps: &'a [LapRecord], driver: &str) -> Option<&'a LapRecord> {
    valid_laps(laps, driver).into_iter().next()
}
