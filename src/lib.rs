// Library interface for lapdelta
// This allows integration tests and benches to access internal modules

pub mod analysis;
pub mod cache;
pub mod config;
pub mod errors;
pub mod telemetry;

// Re-export commonly used types
pub use analysis::{
    CornerDeltaRecord, DeltaSeries, LapComparison, SectorMap, TyreStint, compare_laps,
    compute_delta_time, compute_sector_deltas, detect_corners, extract_stints,
};
pub use cache::{FileBasedCache, ResponseCache};
pub use config::AnalysisConfig;
pub use errors::LapDeltaError;
pub use telemetry::{LapRecord, LapSelector, LapTelemetry, TelemetryProvider, TelemetryTrace};
