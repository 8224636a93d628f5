// Error types for lapdelta

use snafu::Snafu;
use std::io;

use crate::telemetry::Channel;

#[derive(Debug, Snafu)]
pub enum LapDeltaError {
    // Errors for the delta engine
    #[snafu(display("Telemetry does not contain required channel '{channel}'"))]
    MissingChannel { channel: Channel },

    // Errors while loading telemetry from the provider
    #[snafu(display("Error loading telemetry file"))]
    TelemetryLoaderError { source: io::Error },
    #[snafu(display("Invalid telemetry file: {path}"))]
    InvalidTelemetryFile { path: String },
    #[snafu(display("No telemetry for driver {driver} lap {lap_number}"))]
    LapNotFound { driver: String, lap_number: u32 },
    #[snafu(display("No valid laps for driver {driver}"))]
    NoValidLaps { driver: String },

    // Provider cache errors
    #[snafu(display("Could not find a cache directory for provider responses"))]
    NoCacheDir,
    #[snafu(display("Error accessing cache entry: {operation}"))]
    CacheIOError { operation: String, source: io::Error },
    #[snafu(display("Error serializing cache entry"))]
    CacheSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Output errors
    #[snafu(display("Error writing analysis output"))]
    OutputIOError { source: io::Error },
    #[snafu(display("Error serializing analysis output"))]
    OutputSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}
