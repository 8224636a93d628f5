use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    cache::ResponseCache,
    errors::LapDeltaError,
    telemetry::{LapRecord, LapTelemetry},
};

/// Identifies one lap of one driver within a session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LapSelector {
    pub driver: String,
    pub lap_number: u32,
}

impl LapSelector {
    pub fn new(driver: impl Into<String>, lap_number: u32) -> Self {
        Self {
            driver: driver.into(),
            lap_number,
        }
    }
}

/// Source of session timing and lap telemetry.
///
/// Implementations hand over already validated, typed records. The analysis
/// functions never talk to a provider directly.
pub trait TelemetryProvider {
    /// Stable identifier of the loaded session, used to key cached responses.
    fn session_id(&self) -> String;

    /// Timing rows for every lap of every driver in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session data cannot be read.
    fn session_laps(&mut self) -> Result<Vec<LapRecord>, LapDeltaError>;

    /// Car and position telemetry for one selected lap.
    ///
    /// # Errors
    ///
    /// Returns [`LapDeltaError::LapNotFound`] if the session has no such lap.
    fn lap_telemetry(&mut self, selector: &LapSelector) -> Result<LapTelemetry, LapDeltaError>;
}

/// Wraps a provider and answers repeated requests from an injected cache
pub struct CachedProvider<P: TelemetryProvider, C: ResponseCache> {
    inner: P,
    cache: C,
}

impl<P: TelemetryProvider, C: ResponseCache> CachedProvider<P, C> {
    pub fn new(inner: P, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn laps_key(&self) -> String {
        format!("{}/laps", self.inner.session_id())
    }

    fn lap_key(&self, selector: &LapSelector) -> String {
        format!(
            "{}/{}/{}",
            self.inner.session_id(),
            selector.driver,
            selector.lap_number
        )
    }
}

impl<P: TelemetryProvider, C: ResponseCache> TelemetryProvider for CachedProvider<P, C> {
    fn session_id(&self) -> String {
        self.inner.session_id()
    }

    fn session_laps(&mut self) -> Result<Vec<LapRecord>, LapDeltaError> {
        let key = self.laps_key();
        if let Some(laps) = self.cache.load::<Vec<LapRecord>>(&key)? {
            debug!("Serving session laps for {} from cache", key);
            return Ok(laps);
        }
        let laps = self.inner.session_laps()?;
        self.cache.store(&key, &laps)?;
        Ok(laps)
    }

    fn lap_telemetry(&mut self, selector: &LapSelector) -> Result<LapTelemetry, LapDeltaError> {
        let key = self.lap_key(selector);
        if let Some(telemetry) = self.cache.load::<LapTelemetry>(&key)? {
            debug!("Serving telemetry for {} from cache", key);
            return Ok(telemetry);
        }
        info!(
            "Fetching telemetry for {} lap {}",
            selector.driver, selector.lap_number
        );
        let telemetry = self.inner.lap_telemetry(selector)?;
        self.cache.store(&key, &telemetry)?;
        Ok(telemetry)
    }
}
