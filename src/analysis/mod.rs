// Lap comparison analysis: delta time, sectors, corners and tyre stints.
// Every function here is pure and works on already loaded telemetry.

pub mod attribution;
pub mod comparison;
pub mod corners;
pub mod delta;
pub mod overlay;
pub mod sectors;
pub mod stints;
pub mod summary;

pub use attribution::{
    CornerDeltaRecord, CornerMapping, CornerMarker, SkipReason, attribute_corner_deltas,
    locate_corner_markers, map_corners,
};
pub use comparison::{LapComparison, compare_laps};
pub use corners::{
    CornerDetectionConfig, CornerEvent, CornerPreset, detect_corner_events, detect_corners,
};
pub use delta::{DEFAULT_N_POINTS, DeltaSeries, compute_delta_time};
pub use overlay::{ChannelOverlay, OVERLAY_CHANNELS, overlay_channels};
pub use sectors::{SECTOR_LABELS, SectorDelta, SectorMap, compute_sector_deltas};
pub use stints::{TyreStint, extract_stints, stints_for_driver};
pub use summary::{ComparisonSummary, summarize};
