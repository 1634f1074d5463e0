//! Recording fakes of the gain controller submodules.

use std::sync::{Arc, Mutex};

use agc2_components::common::{MAX_FLOAT_S16_VALUE, MIN_FLOAT_S16_VALUE};
use agc2_components::{
    AdaptiveDigitalConfig, AdaptiveDigitalController, AudioBuffer, AvailableCpuFeatures,
    DataDumper, DumpRecord, DumpSink, DumpValue, GainCurveStats, InputVolumeController, Limiter,
    SubmoduleFactory, VoiceActivityDetector,
};

/// A call received by a fake.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateAdaptiveDigital {
        config: AdaptiveDigitalConfig,
        sample_rate_hz: usize,
        num_channels: usize,
        instance_index: usize,
    },
    CreateInputVolume {
        num_channels: usize,
    },
    CreateLimiter {
        sample_rate_hz: usize,
        instance_index: usize,
        histogram_name_prefix: String,
    },
    CreateVad {
        vad_reset_period_ms: i32,
        cpu_features: AvailableCpuFeatures,
        sample_rate_hz: usize,
    },
    AdaptiveProcess {
        speech_probability: f32,
        limiter_envelope: f32,
    },
    AdaptiveInputGainChange,
    VolumeInitialize,
    VolumeSetStreamAnalogLevel(i32),
    VolumeAnalyzePreProcess,
    VolumeProcess {
        speech_probability: f32,
        speech_level_dbfs: Option<f32>,
    },
    VolumeCaptureOutputUsed(bool),
    LimiterProcess,
    LimiterReset,
    LimiterStats,
    VadAnalyze,
}

pub(crate) type CallLog = Arc<Mutex<Vec<Call>>>;

fn push(log: &CallLog, call: Call) {
    log.lock().unwrap().push(call);
}

/// Behavior of the fakes created by [`FakeFactory`].
#[derive(Debug, Clone)]
pub(crate) struct FakeSettings {
    pub vad_speech_probability: f32,
    pub speech_level_dbfs: Option<f32>,
    /// Linear gain applied by the adaptive digital controller.
    pub adaptive_gain: f32,
    /// Recommendation returned after `process`; `None` echoes the applied
    /// volume.
    pub recommended_volume: Option<i32>,
    pub limiter_stats: GainCurveStats,
}

impl Default for FakeSettings {
    fn default() -> Self {
        Self {
            vad_speech_probability: 0.9,
            speech_level_dbfs: None,
            adaptive_gain: 1.0,
            recommended_volume: None,
            limiter_stats: GainCurveStats::default(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeFactory {
    pub log: CallLog,
    pub settings: FakeSettings,
}

impl FakeFactory {
    pub fn with_settings(settings: FakeSettings) -> Self {
        Self {
            log: CallLog::default(),
            settings,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

impl SubmoduleFactory for FakeFactory {
    fn create_adaptive_digital_controller(
        &self,
        config: &AdaptiveDigitalConfig,
        sample_rate_hz: usize,
        num_channels: usize,
        data_dumper: &DataDumper,
    ) -> Box<dyn AdaptiveDigitalController> {
        push(
            &self.log,
            Call::CreateAdaptiveDigital {
                config: *config,
                sample_rate_hz,
                num_channels,
                instance_index: data_dumper.instance_index(),
            },
        );
        Box::new(FakeAdaptiveDigitalController {
            log: Arc::clone(&self.log),
            gain: self.settings.adaptive_gain,
            speech_level_dbfs: self.settings.speech_level_dbfs,
        })
    }

    fn create_input_volume_controller(
        &self,
        num_channels: usize,
    ) -> Box<dyn InputVolumeController> {
        push(&self.log, Call::CreateInputVolume { num_channels });
        Box::new(FakeInputVolumeController {
            log: Arc::clone(&self.log),
            recommended_volume: self.settings.recommended_volume,
            volume: 0,
        })
    }

    fn create_limiter(
        &self,
        sample_rate_hz: usize,
        data_dumper: &DataDumper,
        histogram_name_prefix: &str,
    ) -> Box<dyn Limiter> {
        push(
            &self.log,
            Call::CreateLimiter {
                sample_rate_hz,
                instance_index: data_dumper.instance_index(),
                histogram_name_prefix: histogram_name_prefix.to_string(),
            },
        );
        Box::new(FakeLimiter {
            log: Arc::clone(&self.log),
            data_dumper: data_dumper.clone(),
            stats: self.settings.limiter_stats,
            last_audio_level: 0.0,
        })
    }

    fn create_voice_activity_detector(
        &self,
        vad_reset_period_ms: i32,
        cpu_features: AvailableCpuFeatures,
        sample_rate_hz: usize,
    ) -> Box<dyn VoiceActivityDetector> {
        push(
            &self.log,
            Call::CreateVad {
                vad_reset_period_ms,
                cpu_features,
                sample_rate_hz,
            },
        );
        Box::new(FakeVad {
            log: Arc::clone(&self.log),
            speech_probability: self.settings.vad_speech_probability,
        })
    }
}

pub(crate) struct FakeAdaptiveDigitalController {
    log: CallLog,
    gain: f32,
    speech_level_dbfs: Option<f32>,
}

impl AdaptiveDigitalController for FakeAdaptiveDigitalController {
    fn process(&mut self, audio: &mut AudioBuffer, speech_probability: f32, limiter_envelope: f32) {
        push(
            &self.log,
            Call::AdaptiveProcess {
                speech_probability,
                limiter_envelope,
            },
        );
        for channel in audio.channels_mut() {
            for sample in channel.iter_mut() {
                *sample *= self.gain;
            }
        }
    }

    fn handle_input_gain_change(&mut self) {
        push(&self.log, Call::AdaptiveInputGainChange);
    }

    fn speech_level_dbfs_if_confident(&self) -> Option<f32> {
        self.speech_level_dbfs
    }
}

pub(crate) struct FakeInputVolumeController {
    log: CallLog,
    recommended_volume: Option<i32>,
    volume: i32,
}

impl InputVolumeController for FakeInputVolumeController {
    fn initialize(&mut self) {
        push(&self.log, Call::VolumeInitialize);
    }

    fn set_stream_analog_level(&mut self, input_volume: i32) {
        push(&self.log, Call::VolumeSetStreamAnalogLevel(input_volume));
        self.volume = input_volume;
    }

    fn analyze_pre_process(&mut self, _audio: &AudioBuffer) {
        push(&self.log, Call::VolumeAnalyzePreProcess);
    }

    fn process(&mut self, speech_probability: f32, speech_level_dbfs: Option<f32>) {
        push(
            &self.log,
            Call::VolumeProcess {
                speech_probability,
                speech_level_dbfs,
            },
        );
        if let Some(volume) = self.recommended_volume {
            self.volume = volume;
        }
    }

    fn recommended_analog_level(&self) -> i32 {
        self.volume
    }

    fn handle_capture_output_used_change(&mut self, capture_output_used: bool) {
        push(&self.log, Call::VolumeCaptureOutputUsed(capture_output_used));
    }
}

/// Hard-clips to the FloatS16 range and reports the peak of the last frame
/// as its audio level. Dumps the peak as `limiter_peak_level`.
pub(crate) struct FakeLimiter {
    log: CallLog,
    data_dumper: DataDumper,
    pub stats: GainCurveStats,
    pub last_audio_level: f32,
}

impl FakeLimiter {
    /// A limiter not attached to a factory.
    pub fn standalone() -> Self {
        Self {
            log: CallLog::default(),
            data_dumper: DataDumper::new(0, None),
            stats: GainCurveStats::default(),
            last_audio_level: 0.0,
        }
    }
}

impl Limiter for FakeLimiter {
    fn process(&mut self, audio: &mut AudioBuffer) {
        push(&self.log, Call::LimiterProcess);
        let mut peak = 0.0_f32;
        for channel in audio.channels_mut() {
            for sample in channel.iter_mut() {
                peak = peak.max(sample.abs());
                *sample = sample.clamp(MIN_FLOAT_S16_VALUE, MAX_FLOAT_S16_VALUE);
            }
        }
        self.last_audio_level = peak;
        self.data_dumper.dump_raw("limiter_peak_level", peak);
    }

    fn reset(&mut self) {
        push(&self.log, Call::LimiterReset);
    }

    fn last_audio_level(&self) -> f32 {
        self.last_audio_level
    }

    fn gain_curve_stats(&self) -> GainCurveStats {
        push(&self.log, Call::LimiterStats);
        self.stats
    }
}

pub(crate) struct FakeVad {
    log: CallLog,
    speech_probability: f32,
}

impl VoiceActivityDetector for FakeVad {
    fn analyze(&mut self, _audio: &AudioBuffer) -> f32 {
        push(&self.log, Call::VadAnalyze);
        self.speech_probability
    }
}

/// Collects data dumps.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingDumpSink {
    pub records: Arc<Mutex<Vec<(usize, String, DumpValue)>>>,
}

impl RecordingDumpSink {
    pub fn named(&self, name: &str) -> Vec<(usize, DumpValue)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n, _)| n == name)
            .map(|(instance, _, value)| (*instance, *value))
            .collect()
    }
}

impl DumpSink for RecordingDumpSink {
    fn record(&self, record: &DumpRecord<'_>) {
        self.records.lock().unwrap().push((
            record.instance_index,
            record.name.to_string(),
            record.value,
        ));
    }
}
