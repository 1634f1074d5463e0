//! AGC2 gain controller.
//!
//! [`GainController2`] combines an input volume controller, an adaptive
//! digital controller, a fixed digital gain and a limiter into a per-frame
//! capture pipeline. The submodules are created through a
//! [`SubmoduleFactory`](agc2_components::SubmoduleFactory), so the
//! controller only owns the activation policy and the call order.

pub mod config;
pub mod gain_controller2;
pub mod limiter_stats;

#[cfg(test)]
mod testing;

pub use agc2_components::data_dumper::{
    DataDumper, DumpRecord, DumpSink, DumpValue, InstanceCounter, TracingDumpSink,
};
pub use config::{
    AdaptiveDigital, ConfigError, FixedDigital, GainController2Config,
    InputVolumeControllerConfig,
};
pub use gain_controller2::{
    ActiveSubmodules, GainController2, GainController2Builder, LIMITER_HISTOGRAM_NAME_PREFIX,
};
pub use limiter_stats::LimiterStatsLogger;
