//! Interfaces of the submodules driven by the gain controller.
//!
//! The gain controller owns the activation policy and the call order; the
//! algorithms behind these traits (speech level estimation, gain curves,
//! voice activity detection) are provided by the embedding application
//! through a [`SubmoduleFactory`].

use crate::audio_buffer::AudioBuffer;
use crate::cpu_features::AvailableCpuFeatures;
use crate::data_dumper::DataDumper;

/// Limiter gain curve look-up counters, one per curve region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GainCurveStats {
    pub look_ups_identity_region: usize,
    pub look_ups_knee_region: usize,
    pub look_ups_limiter_region: usize,
    pub look_ups_saturation_region: usize,
}

/// Settings forwarded to the adaptive digital controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveDigitalConfig {
    pub headroom_db: f32,
    pub max_gain_db: f32,
    pub initial_gain_db: f32,
    pub max_gain_change_db_per_second: f32,
    pub max_output_noise_level_dbfs: f32,
}

/// Computes and applies a time-varying digital gain.
pub trait AdaptiveDigitalController: Send {
    /// Adapts and applies the digital gain to `audio`.
    ///
    /// `limiter_envelope` is the limiter's last measured level (FloatS16);
    /// the controller backs off when the signal runs close to the limiter
    /// threshold.
    fn process(&mut self, audio: &mut AudioBuffer, speech_probability: f32, limiter_envelope: f32);

    /// Called when the applied input volume changed, so that the jump is not
    /// mistaken for a speech level change.
    fn handle_input_gain_change(&mut self);

    /// Returns the estimated speech level in dBFS once the estimate has
    /// converged.
    fn speech_level_dbfs_if_confident(&self) -> Option<f32>;
}

/// Recommends input (microphone) volume changes.
pub trait InputVolumeController: Send {
    fn initialize(&mut self);

    /// Sets the volume applied to the current frame, in [0, 255].
    fn set_stream_analog_level(&mut self, input_volume: i32);

    /// Analyzes the unprocessed capture audio (clipping detection).
    fn analyze_pre_process(&mut self, audio: &AudioBuffer);

    /// Updates the recommendation from the speech probability and, when
    /// available, a confident speech level estimate.
    fn process(&mut self, speech_probability: f32, speech_level_dbfs: Option<f32>);

    /// Latest recommended volume, in [0, 255].
    fn recommended_analog_level(&self) -> i32;

    fn handle_capture_output_used_change(&mut self, capture_output_used: bool);
}

/// Final limiting stage; prevents clipping whatever the upstream gains are.
pub trait Limiter: Send {
    fn process(&mut self, audio: &mut AudioBuffer);

    /// Resets the level estimator so the limiter reacts at once to a level
    /// jump.
    fn reset(&mut self);

    /// Last measured audio level (FloatS16).
    fn last_audio_level(&self) -> f32;

    fn gain_curve_stats(&self) -> GainCurveStats;
}

/// Estimates the probability that a frame contains speech.
pub trait VoiceActivityDetector: Send {
    /// Returns a speech probability in [0, 1] for `audio`.
    fn analyze(&mut self, audio: &AudioBuffer) -> f32;
}

/// Creates the submodules of one gain controller instance.
///
/// Only called at construction time; which methods are called is decided by
/// the controller's activation policy. `data_dumper` is tagged with the
/// controller's instance id; submodules keep a clone to dump their own
/// internals.
pub trait SubmoduleFactory {
    fn create_adaptive_digital_controller(
        &self,
        config: &AdaptiveDigitalConfig,
        sample_rate_hz: usize,
        num_channels: usize,
        data_dumper: &DataDumper,
    ) -> Box<dyn AdaptiveDigitalController>;

    /// The gain controller config only switches the input volume controller
    /// on; its tuning (target range, clipping predictor, update periods) is
    /// owned by the factory.
    fn create_input_volume_controller(&self, num_channels: usize)
    -> Box<dyn InputVolumeController>;

    /// `histogram_name_prefix` names the limiter's metrics.
    fn create_limiter(
        &self,
        sample_rate_hz: usize,
        data_dumper: &DataDumper,
        histogram_name_prefix: &str,
    ) -> Box<dyn Limiter>;

    fn create_voice_activity_detector(
        &self,
        vad_reset_period_ms: i32,
        cpu_features: AvailableCpuFeatures,
        sample_rate_hz: usize,
    ) -> Box<dyn VoiceActivityDetector>;
}
