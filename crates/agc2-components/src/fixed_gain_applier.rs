//! Constant digital gain applied to every sample of a frame.

use crate::audio_buffer::AudioBuffer;

/// Multiplies all samples by a fixed linear gain factor.
///
/// No clipping is done; in the gain controller the limiter downstream takes
/// care of it.
#[derive(Debug, Clone)]
pub struct FixedGainApplier {
    gain_factor: f32,
}

impl FixedGainApplier {
    pub fn new(initial_gain_factor: f32) -> Self {
        debug_assert!(initial_gain_factor > 0.0);
        Self {
            gain_factor: initial_gain_factor,
        }
    }

    /// Scales every sample in every channel of `audio` by the gain factor.
    pub fn apply_gain(&self, audio: &mut AudioBuffer) {
        if self.gain_factor == 1.0 {
            return;
        }
        for channel in audio.channels_mut() {
            for sample in channel.iter_mut() {
                *sample *= self.gain_factor;
            }
        }
    }

    pub fn set_gain_factor(&mut self, gain_factor: f32) {
        debug_assert!(gain_factor > 0.0);
        self.gain_factor = gain_factor;
    }

    pub fn gain_factor(&self) -> f32 {
        self.gain_factor
    }
}
