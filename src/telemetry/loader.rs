use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{
    CarSample, LapRecord, LapTelemetry, PositionSample, PositionTrace, TelemetryTrace,
    provider::{LapSelector, TelemetryProvider},
};
use crate::errors::LapDeltaError;

/// Samples for one lap of one driver
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LapSamples<T> {
    pub driver: String,
    pub lap_number: u32,
    pub samples: Vec<T>,
}

/// One line of a session file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SessionOutput {
    Lap(LapRecord),
    CarData(LapSamples<CarSample>),
    PosData(LapSamples<PositionSample>),
}

/// Raw content of a session file, grouped by driver and lap
#[derive(Clone, Debug, Default)]
pub struct SessionData {
    pub laps: Vec<LapRecord>,
    car_data: HashMap<(String, u32), Vec<CarSample>>,
    pos_data: HashMap<(String, u32), Vec<PositionSample>>,
}

impl SessionData {
    fn lap(&self, selector: &LapSelector) -> Option<&LapRecord> {
        self.laps
            .iter()
            .find(|l| l.driver == selector.driver && l.lap_number == selector.lap_number)
    }
}

pub fn load_session_jsonl(source_file: &Path) -> Result<SessionData, LapDeltaError> {
    if !source_file.exists() {
        return Err(LapDeltaError::InvalidTelemetryFile {
            path: format!("{:?}", source_file),
        });
    }

    let session_lines = serde_jsonlines::json_lines(source_file)
        .map_err(|e| LapDeltaError::TelemetryLoaderError { source: e })?
        .collect::<Result<Vec<SessionOutput>, std::io::Error>>()
        .map_err(|e| LapDeltaError::TelemetryLoaderError { source: e })?;

    let mut session = SessionData::default();
    for line in session_lines {
        match line {
            SessionOutput::Lap(lap) => session.laps.push(lap),
            SessionOutput::CarData(lap_samples) => {
                let key = (lap_samples.driver, lap_samples.lap_number);
                if session.car_data.insert(key.clone(), lap_samples.samples).is_some() {
                    warn!("Duplicate car data for {} lap {}, keeping the last one", key.0, key.1);
                }
            }
            SessionOutput::PosData(lap_samples) => {
                let key = (lap_samples.driver, lap_samples.lap_number);
                if session.pos_data.insert(key.clone(), lap_samples.samples).is_some() {
                    warn!("Duplicate position data for {} lap {}, keeping the last one", key.0, key.1);
                }
            }
        }
    }

    info!(
        "Loaded {:?}, found {} laps with car data for {} of them",
        source_file,
        session.laps.len(),
        session.car_data.len()
    );
    Ok(session)
}

/// Provider reading a whole session from a JSON Lines file
pub struct JsonlSessionProvider {
    source_file: PathBuf,
    /// Modification time of the file when it was read, in seconds since the epoch
    modified_s: u64,
    session: SessionData,
}

impl JsonlSessionProvider {
    pub fn open(source_file: PathBuf) -> Result<Self, LapDeltaError> {
        let session = load_session_jsonl(&source_file)?;
        let modified_s = fs::metadata(&source_file)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Self {
            source_file,
            modified_s,
            session,
        })
    }
}

impl TelemetryProvider for JsonlSessionProvider {
    /// File name plus modification time, so an edited file is not answered
    /// from stale cache entries
    fn session_id(&self) -> String {
        let stem = self
            .source_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("session");
        format!("{}-{}", stem, self.modified_s)
    }

    fn session_laps(&mut self) -> Result<Vec<LapRecord>, LapDeltaError> {
        Ok(self.session.laps.clone())
    }

    fn lap_telemetry(&mut self, selector: &LapSelector) -> Result<LapTelemetry, LapDeltaError> {
        let key = (selector.driver.clone(), selector.lap_number);
        let not_found = || LapDeltaError::LapNotFound {
            driver: selector.driver.clone(),
            lap_number: selector.lap_number,
        };

        let lap = self.session.lap(selector).cloned().ok_or_else(not_found)?;
        let car_samples = self.session.car_data.get(&key).ok_or_else(not_found)?;
        let position = self
            .session
            .pos_data
            .get(&key)
            .map(|samples| PositionTrace::from_samples(samples))
            .unwrap_or_default();

        Ok(LapTelemetry {
            lap,
            car: TelemetryTrace::from_samples(car_samples),
            position,
        })
    }
}
