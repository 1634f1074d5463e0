//! Gain Controller 2: drives the AGC2 submodules.
//!
//! Runs once per 10 ms frame. [`GainController2::analyze`] sees the raw
//! capture audio; [`GainController2::process`] then threads the frame
//! through the voice activity detector, the input volume controller, the
//! adaptive digital controller, the fixed digital gain and the limiter, in
//! that order.

use agc2_components::common::{
    MAX_INPUT_VOLUME, MIN_INPUT_VOLUME, db_to_ratio, samples_per_channel,
};
use std::sync::Arc;

use agc2_components::{
    AdaptiveDigitalConfig, AdaptiveDigitalController, AudioBuffer, AvailableCpuFeatures,
    DataDumper, DumpSink, FieldTrialsView, FixedGainApplier, InputVolumeController,
    InstanceCounter, Limiter, NoFieldTrials, SubmoduleFactory, VoiceActivityDetector,
};
use derive_more::Debug;

use crate::config::GainController2Config;
use crate::limiter_stats::LimiterStatsLogger;

/// Prefix of the limiter metrics names.
pub const LIMITER_HISTOGRAM_NAME_PREFIX: &str = "Agc2";

/// Which optional submodules a gain controller instance runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSubmodules {
    pub adaptive_digital_controller: bool,
    pub input_volume_controller: bool,
    pub voice_activity_detector: bool,
}

impl ActiveSubmodules {
    /// Activation policy for `config`.
    ///
    /// The internal VAD only feeds the adaptive digital controller, so it is
    /// created only when that controller is.
    pub fn for_config(config: &GainController2Config, use_internal_vad: bool) -> Self {
        Self {
            adaptive_digital_controller: config.adaptive_digital.enabled,
            input_volume_controller: config.input_volume_controller.enabled,
            voice_activity_detector: config.adaptive_digital.enabled && use_internal_vad,
        }
    }
}

/// Builder for [`GainController2`].
///
/// ```ignore
/// static INSTANCES: InstanceCounter = InstanceCounter::new();
///
/// let agc2 = GainController2::builder(config)
///     .sample_rate_hz(48000)
///     .num_channels(2)
///     .use_internal_vad(true)
///     .build(&factory, &INSTANCES);
/// ```
#[derive(Debug)]
pub struct GainController2Builder<'a> {
    config: GainController2Config,
    sample_rate_hz: usize,
    num_channels: usize,
    use_internal_vad: bool,
    #[debug(skip)]
    field_trials: &'a dyn FieldTrialsView,
    hardware_cpu_features: Option<AvailableCpuFeatures>,
    #[debug(skip)]
    dump_sink: Option<Arc<dyn DumpSink>>,
}

impl<'a> GainController2Builder<'a> {
    fn new(config: GainController2Config) -> Self {
        Self {
            config,
            sample_rate_hz: 48000,
            num_channels: 1,
            use_internal_vad: true,
            field_trials: &NoFieldTrials,
            hardware_cpu_features: None,
            dump_sink: None,
        }
    }

    pub fn sample_rate_hz(mut self, sample_rate_hz: usize) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    pub fn num_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    /// Whether speech probability is computed internally (`true`) or passed
    /// to [`GainController2::process`] by the caller (`false`).
    pub fn use_internal_vad(mut self, use_internal_vad: bool) -> Self {
        self.use_internal_vad = use_internal_vad;
        self
    }

    /// Field trials holding the SIMD kill switches.
    pub fn field_trials(mut self, field_trials: &'a dyn FieldTrialsView) -> Self {
        self.field_trials = field_trials;
        self
    }

    /// Uses `features` instead of probing the CPU. Kill switches still apply.
    pub fn hardware_cpu_features(mut self, features: AvailableCpuFeatures) -> Self {
        self.hardware_cpu_features = Some(features);
        self
    }

    /// Destination of the data dumps of the controller and its submodules.
    pub fn dump_sink(mut self, sink: Arc<dyn DumpSink>) -> Self {
        self.dump_sink = Some(sink);
        self
    }

    /// Creates the gain controller and its active submodules.
    ///
    /// # Panics
    ///
    /// If the config is invalid (see [`GainController2::validate`]), or the
    /// sample rate or channel count is zero.
    pub fn build(
        self,
        factory: &dyn SubmoduleFactory,
        instance_counter: &InstanceCounter,
    ) -> GainController2 {
        if let Err(err) = self.config.check() {
            panic!("invalid GainController2 config: {err}");
        }
        let sample_rate_hz = self.sample_rate_hz;
        let num_channels = self.num_channels;
        assert!(
            samples_per_channel(sample_rate_hz) > 0,
            "unsupported sample rate {sample_rate_hz} Hz"
        );
        assert!(num_channels > 0, "num_channels must be > 0");

        let cpu_features = self
            .hardware_cpu_features
            .unwrap_or_else(AvailableCpuFeatures::detect)
            .with_kill_switches(self.field_trials);

        let mut data_dumper =
            DataDumper::new(instance_counter.next_instance_index(), self.dump_sink);
        data_dumper.initiate_new_set_of_recordings();

        let active = ActiveSubmodules::for_config(&self.config, self.use_internal_vad);
        let adaptive_config = &self.config.adaptive_digital;

        let adaptive_digital_controller = active.adaptive_digital_controller.then(|| {
            factory.create_adaptive_digital_controller(
                &AdaptiveDigitalConfig::from(adaptive_config),
                sample_rate_hz,
                num_channels,
                &data_dumper,
            )
        });

        let mut input_volume_controller = active
            .input_volume_controller
            .then(|| factory.create_input_volume_controller(num_channels));

        let limiter =
            factory.create_limiter(sample_rate_hz, &data_dumper, LIMITER_HISTOGRAM_NAME_PREFIX);

        let vad = active.voice_activity_detector.then(|| {
            factory.create_voice_activity_detector(
                adaptive_config.vad_reset_period_ms,
                cpu_features,
                sample_rate_hz,
            )
        });

        if let Some(ivc) = input_volume_controller.as_mut() {
            ivc.initialize();
        }

        tracing::debug!(
            instance = data_dumper.instance_index(),
            sample_rate_hz,
            num_channels,
            simd = cpu_features.best_name(),
            adaptive_digital = active.adaptive_digital_controller,
            input_volume_controller = active.input_volume_controller,
            internal_vad = active.voice_activity_detector,
            "GainController2 created"
        );

        GainController2 {
            cpu_features,
            data_dumper,
            fixed_gain_applier: FixedGainApplier::new(db_to_ratio(
                self.config.fixed_digital.gain_db,
            )),
            adaptive_digital_controller,
            input_volume_controller,
            vad,
            limiter,
            limiter_stats: LimiterStatsLogger::default(),
            sample_rate_hz,
            num_channels,
        }
    }
}

/// Gain Controller 2 aims to automatically adjust levels by acting on the
/// microphone gain and/or applying digital gain.
///
/// Not thread-safe: all calls for one audio stream must come from the same
/// thread, one frame at a time, `analyze` before `process`.
#[derive(Debug)]
pub struct GainController2 {
    cpu_features: AvailableCpuFeatures,
    data_dumper: DataDumper,
    fixed_gain_applier: FixedGainApplier,
    #[debug(skip)]
    adaptive_digital_controller: Option<Box<dyn AdaptiveDigitalController>>,
    #[debug(skip)]
    input_volume_controller: Option<Box<dyn InputVolumeController>>,
    #[debug(skip)]
    vad: Option<Box<dyn VoiceActivityDetector>>,
    #[debug(skip)]
    limiter: Box<dyn Limiter>,
    limiter_stats: LimiterStatsLogger,
    sample_rate_hz: usize,
    num_channels: usize,
}

impl GainController2 {
    /// Returns a builder for a gain controller running with `config`.
    pub fn builder<'a>(config: GainController2Config) -> GainController2Builder<'a> {
        GainController2Builder::new(config)
    }

    /// Creates a new GainController2 without kill switches or data dumps.
    ///
    /// If `use_internal_vad` is true, an internal voice activity detector is
    /// used for digital adaptive gain.
    pub fn new(
        config: &GainController2Config,
        factory: &dyn SubmoduleFactory,
        instance_counter: &InstanceCounter,
        sample_rate_hz: usize,
        num_channels: usize,
        use_internal_vad: bool,
    ) -> Self {
        Self::builder(*config)
            .sample_rate_hz(sample_rate_hz)
            .num_channels(num_channels)
            .use_internal_vad(use_internal_vad)
            .build(factory, instance_counter)
    }

    /// Validates the configuration.
    pub fn validate(config: &GainController2Config) -> bool {
        config.check().is_ok()
    }

    /// Sets the fixed digital gain.
    pub fn set_fixed_gain_db(&mut self, gain_db: f32) {
        let gain_factor = db_to_ratio(gain_db);
        if self.fixed_gain_applier.gain_factor() != gain_factor {
            // Reset the limiter to quickly react on abrupt level changes
            // caused by large changes of the fixed gain.
            self.limiter.reset();
        }
        self.fixed_gain_applier.set_gain_factor(gain_factor);
    }

    /// Updates the input volume controller about whether the capture output
    /// is used or not.
    pub fn set_capture_output_used(&mut self, capture_output_used: bool) {
        if let Some(ivc) = self.input_volume_controller.as_mut() {
            ivc.handle_capture_output_used_change(capture_output_used);
        }
    }

    /// Analyzes `audio_buffer` before `process()` is called so that the
    /// analysis can be performed before digital processing operations take
    /// place (e.g., echo cancellation). The analysis consists of input
    /// clipping detection and prediction (if enabled).
    ///
    /// # Panics
    ///
    /// If `applied_input_volume` is outside [0, 255].
    pub fn analyze(&mut self, applied_input_volume: i32, audio_buffer: &AudioBuffer) {
        assert!(
            (MIN_INPUT_VOLUME..=MAX_INPUT_VOLUME).contains(&applied_input_volume),
            "applied input volume {applied_input_volume} outside [0, 255]"
        );
        if let Some(ivc) = self.input_volume_controller.as_mut() {
            ivc.set_stream_analog_level(applied_input_volume);
            ivc.analyze_pre_process(audio_buffer);
        }
    }

    /// Returns the recommended input volume, if the input volume controller
    /// is enabled.
    pub fn recommended_input_volume(&self) -> Option<i32> {
        self.input_volume_controller
            .as_ref()
            .map(|ivc| ivc.recommended_analog_level())
    }

    /// Updates the recommended input volume, applies the adaptive digital and
    /// the fixed digital gains, and runs a limiter on `audio`.
    ///
    /// `speech_probability` must be `None` when the internal VAD is used and
    /// `Some` value in [0, 1] when speech probability is needed but computed
    /// externally.
    ///
    /// # Panics
    ///
    /// If the speech probability contract above is violated.
    pub fn process(
        &mut self,
        speech_probability: Option<f32>,
        input_volume_changed: bool,
        audio: &mut AudioBuffer,
    ) {
        debug_assert_eq!(audio.num_channels(), self.num_channels);
        debug_assert_eq!(
            audio.samples_per_channel(),
            samples_per_channel(self.sample_rate_hz)
        );

        self.data_dumper
            .dump_raw("agc2_applied_input_volume_changed", input_volume_changed);
        if input_volume_changed {
            if let Some(adc) = self.adaptive_digital_controller.as_mut() {
                adc.handle_input_gain_change();
            }
        }

        let speech_probability = match self.vad.as_mut() {
            Some(vad) => {
                assert!(
                    speech_probability.is_none(),
                    "speech probability passed while the internal VAD is active"
                );
                let probability = vad.analyze(audio);
                debug_assert!((0.0..=1.0).contains(&probability));
                Some(probability)
            }
            None => {
                if let Some(probability) = speech_probability {
                    assert!(
                        (0.0..=1.0).contains(&probability),
                        "speech probability {probability} outside [0, 1]"
                    );
                }
                speech_probability
            }
        };
        if let Some(probability) = speech_probability {
            self.data_dumper
                .dump_raw("agc2_speech_probability", probability);
        }

        if let Some(ivc) = self.input_volume_controller.as_mut() {
            let speech_level_dbfs = self
                .adaptive_digital_controller
                .as_ref()
                .and_then(|adc| adc.speech_level_dbfs_if_confident());
            ivc.process(
                required(speech_probability, "input volume controller"),
                speech_level_dbfs,
            );
        }

        if let Some(adc) = self.adaptive_digital_controller.as_mut() {
            adc.process(
                audio,
                required(speech_probability, "adaptive digital controller"),
                self.limiter.last_audio_level(),
            );
        }

        self.fixed_gain_applier.apply_gain(audio);

        self.limiter.process(audio);

        self.limiter_stats.on_frame(self.limiter.as_ref());
    }

    /// Which optional submodules this instance runs.
    pub fn active_submodules(&self) -> ActiveSubmodules {
        ActiveSubmodules {
            adaptive_digital_controller: self.adaptive_digital_controller.is_some(),
            input_volume_controller: self.input_volume_controller.is_some(),
            voice_activity_detector: self.vad.is_some(),
        }
    }

    /// CPU features made available to the submodules.
    pub fn cpu_features(&self) -> AvailableCpuFeatures {
        self.cpu_features
    }

    /// Id tagging this instance's data dumps.
    pub fn instance_index(&self) -> usize {
        self.data_dumper.instance_index()
    }

    /// Current fixed digital gain as a linear factor.
    pub fn fixed_gain_factor(&self) -> f32 {
        self.fixed_gain_applier.gain_factor()
    }
}

fn required(speech_probability: Option<f32>, consumer: &str) -> f32 {
    match speech_probability {
        Some(probability) => probability,
        None => panic!("{consumer} requires a speech probability"),
    }
}
