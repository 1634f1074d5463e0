//! AGC2 common constants and level conversions.
//!
//! Samples are in the FloatS16 convention: `f32` values in
//! \[-32768.0, 32768.0\].

pub const MIN_FLOAT_S16_VALUE: f32 = -32768.0;
pub const MAX_FLOAT_S16_VALUE: f32 = 32767.0;

/// Duration of one processed frame.
pub const FRAME_DURATION_MS: i32 = 10;

/// Number of frames processed per second.
pub const FRAMES_PER_SECOND: usize = 1000 / FRAME_DURATION_MS as usize;

/// Number of milliseconds to wait to periodically reset the VAD.
pub const VAD_RESET_PERIOD_MS: i32 = 1500;

/// Lowest applied input (microphone) volume.
pub const MIN_INPUT_VOLUME: i32 = 0;

/// Highest applied input (microphone) volume.
pub const MAX_INPUT_VOLUME: i32 = 255;

/// Number of samples per channel in one frame at `sample_rate_hz`.
#[inline]
pub const fn samples_per_channel(sample_rate_hz: usize) -> usize {
    sample_rate_hz / FRAMES_PER_SECOND
}

/// Convert a dB value to a linear ratio.
#[inline]
pub fn db_to_ratio(v: f32) -> f32 {
    10.0_f32.powf(v / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_to_ratio_known_values() {
        assert_eq!(db_to_ratio(0.0), 1.0);
        assert!((db_to_ratio(20.0) - 10.0).abs() < 1e-5);
        assert!((db_to_ratio(-20.0) - 0.1).abs() < 1e-6);
        assert!((db_to_ratio(6.0) - 1.995_262).abs() < 1e-5);
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(samples_per_channel(8000), 80);
        assert_eq!(samples_per_channel(16000), 160);
        assert_eq!(samples_per_channel(48000), 480);
    }
}
