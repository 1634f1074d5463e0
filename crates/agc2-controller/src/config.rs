//! Gain controller configuration.
//!
//! The config is a snapshot taken at construction; only the fixed digital
//! gain can be changed afterwards (see
//! [`GainController2::set_fixed_gain_db`](crate::GainController2::set_fixed_gain_db)).

use agc2_components::AdaptiveDigitalConfig;
use agc2_components::common::VAD_RESET_PERIOD_MS;

/// Fixed digital controller settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDigital {
    /// Gain in dB, in [0, 50).
    pub gain_db: f32,
}

impl Default for FixedDigital {
    fn default() -> Self {
        Self { gain_db: 0.0 }
    }
}

/// Adaptive digital controller settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveDigital {
    pub enabled: bool,
    /// Must be >= 0.
    pub headroom_db: f32,
    /// Must be > 0.
    pub max_gain_db: f32,
    /// Must be >= 0.
    pub initial_gain_db: f32,
    /// Must be > 0.
    pub max_gain_change_db_per_second: f32,
    /// Must be <= 0.
    pub max_output_noise_level_dbfs: f32,
    /// Period after which the internal voice activity detector is reset.
    pub vad_reset_period_ms: i32,
}

impl Default for AdaptiveDigital {
    fn default() -> Self {
        Self {
            enabled: false,
            headroom_db: 5.0,
            max_gain_db: 50.0,
            initial_gain_db: 15.0,
            max_gain_change_db_per_second: 6.0,
            max_output_noise_level_dbfs: -50.0,
            vad_reset_period_ms: VAD_RESET_PERIOD_MS,
        }
    }
}

impl From<&AdaptiveDigital> for AdaptiveDigitalConfig {
    fn from(c: &AdaptiveDigital) -> Self {
        Self {
            headroom_db: c.headroom_db,
            max_gain_db: c.max_gain_db,
            initial_gain_db: c.initial_gain_db,
            max_gain_change_db_per_second: c.max_gain_change_db_per_second,
            max_output_noise_level_dbfs: c.max_output_noise_level_dbfs,
        }
    }
}

/// Input volume controller settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputVolumeControllerConfig {
    pub enabled: bool,
}

/// Top-level gain controller configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GainController2Config {
    pub fixed_digital: FixedDigital,
    pub adaptive_digital: AdaptiveDigital,
    pub input_volume_controller: InputVolumeControllerConfig,
}

/// A configuration field outside of its allowed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    FixedGainOutOfRange(f32),
    NegativeHeadroom(f32),
    NonPositiveMaxGain(f32),
    NegativeInitialGain(f32),
    NonPositiveMaxGainChangeSpeed(f32),
    PositiveMaxOutputNoiseLevel(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedGainOutOfRange(v) => {
                write!(f, "fixed digital gain {v} dB is outside [0, 50)")
            }
            Self::NegativeHeadroom(v) => write!(f, "headroom {v} dB must be >= 0"),
            Self::NonPositiveMaxGain(v) => write!(f, "max gain {v} dB must be > 0"),
            Self::NegativeInitialGain(v) => write!(f, "initial gain {v} dB must be >= 0"),
            Self::NonPositiveMaxGainChangeSpeed(v) => {
                write!(f, "max gain change speed {v} dB/s must be > 0")
            }
            Self::PositiveMaxOutputNoiseLevel(v) => {
                write!(f, "max output noise level {v} dBFS must be <= 0")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const MAX_FIXED_GAIN_DB: f32 = 50.0;

// NaN fails every check.
fn is_non_negative(v: f32) -> bool {
    v >= 0.0
}

fn is_positive(v: f32) -> bool {
    v > 0.0
}

fn is_non_positive(v: f32) -> bool {
    v <= 0.0
}

impl GainController2Config {
    /// Returns the first field that is out of range, if any.
    pub fn check(&self) -> Result<(), ConfigError> {
        let fixed = &self.fixed_digital;
        let adaptive = &self.adaptive_digital;
        if !(0.0..MAX_FIXED_GAIN_DB).contains(&fixed.gain_db) {
            return Err(ConfigError::FixedGainOutOfRange(fixed.gain_db));
        }
        if !is_non_negative(adaptive.headroom_db) {
            return Err(ConfigError::NegativeHeadroom(adaptive.headroom_db));
        }
        if !is_positive(adaptive.max_gain_db) {
            return Err(ConfigError::NonPositiveMaxGain(adaptive.max_gain_db));
        }
        if !is_non_negative(adaptive.initial_gain_db) {
            return Err(ConfigError::NegativeInitialGain(adaptive.initial_gain_db));
        }
        if !is_positive(adaptive.max_gain_change_db_per_second) {
            return Err(ConfigError::NonPositiveMaxGainChangeSpeed(
                adaptive.max_gain_change_db_per_second,
            ));
        }
        if !is_non_positive(adaptive.max_output_noise_level_dbfs) {
            return Err(ConfigError::PositiveMaxOutputNoiseLevel(
                adaptive.max_output_noise_level_dbfs,
            ));
        }
        Ok(())
    }

    /// Returns `self` if valid, the default config otherwise.
    pub fn validated_or_default(self) -> Self {
        match self.check() {
            Ok(()) => self,
            Err(err) => {
                tracing::error!(%err, "Invalid GainController2 config; using default");
                Self::default()
            }
        }
    }
}
