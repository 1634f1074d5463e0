//! Periodic logging of the limiter gain curve statistics.

use agc2_components::common::FRAME_DURATION_MS;
use agc2_components::{GainCurveStats, Limiter};

pub const LOG_LIMITER_STATS_PERIOD_MS: i32 = 30_000;
pub const LOG_LIMITER_STATS_PERIOD_NUM_FRAMES: usize =
    (LOG_LIMITER_STATS_PERIOD_MS / FRAME_DURATION_MS) as usize;

/// Counts processed frames and logs the limiter stats once per period.
#[derive(Debug, Clone)]
pub struct LimiterStatsLogger {
    period_num_frames: usize,
    calls_since_last_log: usize,
}

impl Default for LimiterStatsLogger {
    fn default() -> Self {
        Self::new(LOG_LIMITER_STATS_PERIOD_NUM_FRAMES)
    }
}

impl LimiterStatsLogger {
    pub fn new(period_num_frames: usize) -> Self {
        assert!(period_num_frames > 0);
        Self {
            period_num_frames,
            calls_since_last_log: 0,
        }
    }

    /// Counts one frame. At the end of a period, logs and returns the limiter
    /// stats and restarts counting.
    pub fn on_frame(&mut self, limiter: &dyn Limiter) -> Option<GainCurveStats> {
        self.calls_since_last_log += 1;
        if self.calls_since_last_log < self.period_num_frames {
            return None;
        }
        self.calls_since_last_log = 0;
        let stats = limiter.gain_curve_stats();
        tracing::info!(
            identity = stats.look_ups_identity_region,
            knee = stats.look_ups_knee_region,
            limiter = stats.look_ups_limiter_region,
            saturation = stats.look_ups_saturation_region,
            "AGC2 limiter stats"
        );
        Some(stats)
    }

    pub fn calls_since_last_log(&self) -> usize {
        self.calls_since_last_log
    }
}
