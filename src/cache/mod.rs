// Response cache for the telemetry provider
// Keeps provider responses on disk so repeated comparisons of the same
// session do not go back to the provider

pub mod storage;

pub use storage::{FileBasedCache, ResponseCache};
