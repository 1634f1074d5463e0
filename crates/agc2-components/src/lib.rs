//! Building blocks of the AGC2 gain controller.
//!
//! Contains the audio frame container, the fixed digital gain stage, CPU
//! feature detection with field-trial kill switches, instance-tagged data
//! dumps, and the interfaces of the submodules that the gain controller
//! drives.

pub mod audio_buffer;
pub mod common;
pub mod cpu_features;
pub mod data_dumper;
pub mod field_trials;
pub mod fixed_gain_applier;
pub mod submodules;

pub use audio_buffer::AudioBuffer;
pub use cpu_features::AvailableCpuFeatures;
pub use data_dumper::{
    DataDumper, DumpRecord, DumpSink, DumpValue, InstanceCounter, TracingDumpSink,
};
pub use field_trials::{FieldTrials, FieldTrialsError, FieldTrialsView, NoFieldTrials};
pub use fixed_gain_applier::FixedGainApplier;
pub use submodules::{
    AdaptiveDigitalConfig, AdaptiveDigitalController, GainCurveStats, InputVolumeController,
    Limiter, SubmoduleFactory, VoiceActivityDetector,
};
