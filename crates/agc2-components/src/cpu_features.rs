//! Runtime CPU feature detection with per-feature kill switches.
//!
//! Detection happens once per gain controller; the result is handed to the
//! submodules that have vectorized paths (e.g. the voice activity detector).

use crate::field_trials::FieldTrialsView;

pub const SSE2_KILL_SWITCH: &str = "WebRTC-Agc2SimdSse2KillSwitch";
pub const AVX2_KILL_SWITCH: &str = "WebRTC-Agc2SimdAvx2KillSwitch";
pub const NEON_KILL_SWITCH: &str = "WebRTC-Agc2SimdNeonKillSwitch";

// Runtime CPU feature detection via cpufeatures (atomic-cached).
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cpufeatures::new!(has_avx2_fma, "avx2", "fma");
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cpufeatures::new!(has_sse2, "sse2");

/// Instruction set extensions usable by vectorized code paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableCpuFeatures {
    /// x86/x86_64 SSE2.
    pub sse2: bool,
    /// x86/x86_64 AVX2 + FMA.
    pub avx2: bool,
    /// ARM aarch64 NEON.
    pub neon: bool,
}

impl AvailableCpuFeatures {
    /// Probes the current CPU.
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            Self {
                sse2: has_sse2::get(),
                avx2: has_avx2_fma::get(),
                neon: false,
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            Self {
                sse2: false,
                avx2: false,
                neon: true,
            }
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::none()
        }
    }

    /// No vector extension; scalar code only.
    pub const fn none() -> Self {
        Self {
            sse2: false,
            avx2: false,
            neon: false,
        }
    }

    /// Clears every feature whose kill switch is enabled in `field_trials`.
    ///
    /// Each switch is checked independently; a feature stays available only
    /// if the hardware has it and its switch is off.
    pub fn with_kill_switches(self, field_trials: &dyn FieldTrialsView) -> Self {
        Self {
            sse2: self.sse2 && !field_trials.is_enabled(SSE2_KILL_SWITCH),
            avx2: self.avx2 && !field_trials.is_enabled(AVX2_KILL_SWITCH),
            neon: self.neon && !field_trials.is_enabled(NEON_KILL_SWITCH),
        }
    }

    /// Returns the name of the widest available extension.
    pub fn best_name(self) -> &'static str {
        if self.avx2 {
            "avx2+fma"
        } else if self.sse2 {
            "sse2"
        } else if self.neon {
            "neon"
        } else {
            "scalar"
        }
    }
}

/// Detects the CPU features and applies the kill switches in `field_trials`.
pub fn allowed_cpu_features(field_trials: &dyn FieldTrialsView) -> AvailableCpuFeatures {
    AvailableCpuFeatures::detect().with_kill_switches(field_trials)
}
