//! Session configuration
//!
//! Defaults mirror a typical scanning UI: rear camera at 1280x720,
//! sampling around 15 frames per second, and a found result lingering
//! for half a second before the session closes itself. Each knob has a
//! `QRSCAN_*` environment override for field debugging.

use std::time::Duration;

use crate::camera::{FacingMode, StreamConstraints};

/// Fastest and slowest permitted tick spacing.
const TICK_INTERVAL_MIN: Duration = Duration::from_millis(1);
const TICK_INTERVAL_MAX: Duration = Duration::from_millis(100);

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
}

fn parse_env_facing(name: &str, default: FacingMode) -> FacingMode {
    match std::env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "rear" => FacingMode::Rear,
            "front" => FacingMode::Front,
            "any" => FacingMode::Any,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Tunable parameters for a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Constraints handed to the camera on every `start`.
    pub constraints: StreamConstraints,
    /// Spacing between decode ticks. Clamped to 1..=100 ms.
    pub tick_interval: Duration,
    /// How long a found result stays up before the session closes
    /// itself. Zero closes on the tick after the find.
    pub found_linger: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            constraints: StreamConstraints::default(),
            tick_interval: Duration::from_millis(66),
            found_linger: Duration::from_millis(500),
        }
    }
}

impl ScanConfig {
    /// Configuration with the stock defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from `QRSCAN_*` environment variables:
    /// `QRSCAN_TICK_MS`, `QRSCAN_LINGER_MS`, `QRSCAN_FACING`
    /// (`rear`/`front`/`any`), `QRSCAN_WIDTH` and `QRSCAN_HEIGHT`.
    pub fn from_env() -> Self {
        let base = Self::default();
        let mut config = base
            .clone()
            .with_tick_interval(Duration::from_millis(parse_env_u64(
                "QRSCAN_TICK_MS",
                base.tick_interval.as_millis() as u64,
            )))
            .with_found_linger(Duration::from_millis(parse_env_u64(
                "QRSCAN_LINGER_MS",
                base.found_linger.as_millis() as u64,
            )))
            .with_facing(parse_env_facing("QRSCAN_FACING", base.constraints.facing));

        if let (Some(w), Some(h)) = (parse_env_u32("QRSCAN_WIDTH"), parse_env_u32("QRSCAN_HEIGHT"))
        {
            config.constraints.ideal_resolution = Some((w, h));
        }
        config
    }

    /// Replace the camera constraints wholesale.
    pub fn with_constraints(mut self, constraints: StreamConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Set the preferred camera facing.
    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.constraints.facing = facing;
        self
    }

    /// Set the preferred capture resolution.
    pub fn with_ideal_resolution(mut self, width: u32, height: u32) -> Self {
        self.constraints.ideal_resolution = Some((width, height));
        self
    }

    /// Set the tick spacing, clamped to 1..=100 ms.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.clamp(TICK_INTERVAL_MIN, TICK_INTERVAL_MAX);
        self
    }

    /// Set how long a found result lingers before auto-close.
    pub fn with_found_linger(mut self, linger: Duration) -> Self {
        self.found_linger = linger;
        self
    }
}
