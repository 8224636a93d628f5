pub mod laps;
pub mod loader;
pub mod provider;

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::LapDeltaError;

pub use laps::{fastest_lap, valid_laps};
pub use loader::{JsonlSessionProvider, SessionOutput, load_session_jsonl};
pub use provider::{CachedProvider, LapSelector, TelemetryProvider};

/// Named telemetry channels a trace can carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Distance,
    Speed,
    Throttle,
    Brake,
    Time,
    X,
    Y,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Distance => "Distance",
            Channel::Speed => "Speed",
            Channel::Throttle => "Throttle",
            Channel::Brake => "Brake",
            Channel::Time => "Time",
            Channel::X => "X",
            Channel::Y => "Y",
        };
        f.write_str(name)
    }
}

/// A single car data row as handed over by the telemetry provider.
/// Every channel is optional until the row is validated into a trace.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CarSample {
    /// Meters traveled from the start of the lap
    pub distance: Option<f64>,
    /// Speed in km/h
    pub speed: Option<f64>,
    /// Throttle use, 0-100
    pub throttle: Option<f64>,
    /// Brake use
    pub brake: Option<f64>,
    /// Session time in seconds
    pub time: Option<f64>,
}

/// A single position row, sampled independently from the car data
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Session time in seconds
    pub time: Option<f64>,
}

/// Column oriented car telemetry for one lap.
///
/// A channel is present only when every sample of the lap carries it. Absent
/// channels are reported by the analysis functions that need them.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetryTrace {
    distance: Option<Vec<f64>>,
    speed: Option<Vec<f64>>,
    throttle: Option<Vec<f64>>,
    brake: Option<Vec<f64>>,
    time: Option<Vec<f64>>,
}

fn column(samples: &[CarSample], value: impl Fn(&CarSample) -> Option<f64>) -> Option<Vec<f64>> {
    if samples.is_empty() {
        return None;
    }
    samples.iter().map(value).collect()
}

fn non_empty(values: Vec<f64>) -> Option<Vec<f64>> {
    if values.is_empty() { None } else { Some(values) }
}

impl TelemetryTrace {
    /// Build a trace from distance (m) and speed (km/h) columns of equal length
    pub fn new(distance: Vec<f64>, speed: Vec<f64>) -> Self {
        Self {
            distance: non_empty(distance),
            speed: non_empty(speed),
            ..Default::default()
        }
    }

    /// Attach a session time column
    pub fn with_time(mut self, time: Vec<f64>) -> Self {
        self.time = non_empty(time);
        self
    }

    /// Attach throttle and brake columns
    pub fn with_pedals(mut self, throttle: Vec<f64>, brake: Vec<f64>) -> Self {
        self.throttle = non_empty(throttle);
        self.brake = non_empty(brake);
        self
    }

    /// Validate raw provider rows into a trace
    pub fn from_samples(samples: &[CarSample]) -> Self {
        let trace = Self {
            distance: column(samples, |s| s.distance),
            speed: column(samples, |s| s.speed),
            throttle: column(samples, |s| s.throttle),
            brake: column(samples, |s| s.brake),
            time: column(samples, |s| s.time),
        };
        if let Some(distance) = &trace.distance {
            if distance.windows(2).any(|w| w[1] < w[0]) {
                warn!("Distance channel is not monotonic over {} samples", distance.len());
            }
        }
        trace
    }

    pub fn len(&self) -> usize {
        self.distance
            .as_ref()
            .or(self.speed.as_ref())
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channel(channel).is_ok()
    }

    /// Borrow a channel, failing with [`LapDeltaError::MissingChannel`] when absent
    pub fn channel(&self, channel: Channel) -> Result<&[f64], LapDeltaError> {
        let values = match channel {
            Channel::Distance => self.distance.as_deref(),
            Channel::Speed => self.speed.as_deref(),
            Channel::Throttle => self.throttle.as_deref(),
            Channel::Brake => self.brake.as_deref(),
            Channel::Time => self.time.as_deref(),
            Channel::X | Channel::Y => None,
        };
        values.ok_or(LapDeltaError::MissingChannel { channel })
    }

    pub fn distance(&self) -> Result<&[f64], LapDeltaError> {
        self.channel(Channel::Distance)
    }

    pub fn speed(&self) -> Result<&[f64], LapDeltaError> {
        self.channel(Channel::Speed)
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }
}

/// Track position samples for one lap. Only used to place results on a map.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionTrace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub time: Vec<f64>,
}

impl PositionTrace {
    /// Rows missing any of x, y or time are dropped
    pub fn from_samples(samples: &[PositionSample]) -> Self {
        let mut trace = Self::default();
        for sample in samples {
            if let (Some(x), Some(y), Some(time)) = (sample.x, sample.y, sample.time) {
                trace.x.push(x);
                trace.y.push(y);
                trace.time.push(time);
            }
        }
        if trace.len() != samples.len() {
            warn!(
                "Dropped {} incomplete position samples",
                samples.len() - trace.len()
            );
        }
        trace
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Tyre compound as reported by the timing data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl TyreCompound {
    /// Case insensitive parse, anything unrecognised maps to `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "SOFT" => Self::Soft,
            "MEDIUM" => Self::Medium,
            "HARD" => Self::Hard,
            "INTERMEDIATE" => Self::Intermediate,
            "WET" => Self::Wet,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TyreCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Soft => "SOFT",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
            Self::Intermediate => "INTERMEDIATE",
            Self::Wet => "WET",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Timing row for one lap of one driver
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LapRecord {
    pub driver: String,
    /// Full name of the driver, `driver` holds the three letter code
    pub driver_name: Option<String>,
    pub team: Option<String>,
    pub lap_number: u32,
    /// Lap time in seconds, missing for laps without a valid time
    pub lap_time_s: Option<f64>,
    pub compound: Option<String>,
    /// Session time the car entered the pit lane, set on in-laps
    pub pit_in_time_s: Option<f64>,
    /// Session time the car left the pit lane, set on out-laps
    pub pit_out_time_s: Option<f64>,
}

impl LapRecord {
    /// A timed lap that neither starts nor ends in the pit lane
    pub fn is_valid(&self) -> bool {
        self.lap_time_s.is_some() && self.pit_in_time_s.is_none() && self.pit_out_time_s.is_none()
    }

    pub fn compound(&self) -> TyreCompound {
        self.compound
            .as_deref()
            .map(TyreCompound::from_label)
            .unwrap_or(TyreCompound::Unknown)
    }
}

/// Everything the analysis needs for one selected lap
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LapTelemetry {
    pub lap: LapRecord,
    pub car: TelemetryTrace,
    pub position: PositionTrace,
}
