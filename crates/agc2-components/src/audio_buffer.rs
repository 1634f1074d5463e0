//! Planar multi-channel buffer holding one 10 ms frame of FloatS16 audio.
//!
//! The samples live in a single contiguous allocation, one channel after the
//! other:
//!
//! ```text
//! [ ch0[0..n] | ch1[0..n] | ... ]
//! ```
//!
//! The buffer is owned by the caller and lent to the gain controller for the
//! duration of one call; gain stages scale it in place.

use derive_more::Debug;

use crate::common::samples_per_channel;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    #[debug(skip)]
    data: Vec<f32>,
    samples_per_channel: usize,
    num_channels: usize,
}

impl AudioBuffer {
    /// Creates a zero-initialized buffer.
    pub fn new(samples_per_channel: usize, num_channels: usize) -> Self {
        assert!(samples_per_channel > 0, "samples_per_channel must be > 0");
        assert!(num_channels > 0, "num_channels must be > 0");
        Self {
            data: vec![0.0; samples_per_channel * num_channels],
            samples_per_channel,
            num_channels,
        }
    }

    /// Creates a zero-initialized buffer sized for one frame at `sample_rate_hz`.
    pub fn for_sample_rate(sample_rate_hz: usize, num_channels: usize) -> Self {
        Self::new(samples_per_channel(sample_rate_hz), num_channels)
    }

    /// Creates a buffer from interleaved samples.
    ///
    /// `interleaved.len()` must be a multiple of `num_channels`.
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize) -> Self {
        assert!(num_channels > 0, "num_channels must be > 0");
        assert!(
            interleaved.len().is_multiple_of(num_channels),
            "interleaved length ({}) must be divisible by num_channels ({num_channels})",
            interleaved.len()
        );
        let mut buffer = Self::new(interleaved.len() / num_channels, num_channels);
        for (i, frame) in interleaved.chunks_exact(num_channels).enumerate() {
            for (ch, &sample) in frame.iter().enumerate() {
                buffer.channel_mut(ch)[i] = sample;
            }
        }
        buffer
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        debug_assert!(channel < self.num_channels);
        let start = channel * self.samples_per_channel;
        &self.data[start..start + self.samples_per_channel]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        debug_assert!(channel < self.num_channels);
        let start = channel * self.samples_per_channel;
        &mut self.data[start..start + self.samples_per_channel]
    }

    /// Iterates over the channels.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.samples_per_channel)
    }

    /// Iterates mutably over the channels.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.data.chunks_exact_mut(self.samples_per_channel)
    }

    /// Sets every sample of every channel to `value`.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }
}
