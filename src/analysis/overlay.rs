use log::debug;
use serde::{Deserialize, Serialize};

use super::delta::interp;
use crate::telemetry::{Channel, TelemetryTrace};

/// Channels plotted against distance next to the delta
pub const OVERLAY_CHANNELS: [Channel; 3] = [Channel::Speed, Channel::Throttle, Channel::Brake];

/// One channel of both laps, resampled onto a shared distance axis
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelOverlay {
    pub channel: Channel,
    pub lap_a: Vec<f64>,
    pub lap_b: Vec<f64>,
}

fn resample(axis: &[f64], distance: &[f64], values: &[f64]) -> Vec<f64> {
    axis.iter().map(|&d| interp(d, distance, values)).collect()
}

/// Resample speed, throttle and brake of both laps onto `axis`.
///
/// A channel is only included when both laps carry it. Laps without a
/// distance channel yield no overlays.
pub fn overlay_channels(
    trace_a: &TelemetryTrace,
    trace_b: &TelemetryTrace,
    axis: &[f64],
) -> Vec<ChannelOverlay> {
    let (Ok(distance_a), Ok(distance_b)) = (trace_a.distance(), trace_b.distance()) else {
        return Vec::new();
    };

    OVERLAY_CHANNELS
        .iter()
        .filter_map(|&channel| {
            match (trace_a.channel(channel), trace_b.channel(channel)) {
                (Ok(values_a), Ok(values_b)) => Some(ChannelOverlay {
                    channel,
                    lap_a: resample(axis, distance_a, values_a),
                    lap_b: resample(axis, distance_b, values_b),
                }),
                _ => {
                    debug!("{} is not available on both laps, no overlay", channel);
                    None
                }
            }
        })
        .collect()
}
