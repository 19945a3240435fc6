use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    COUNTDOWN_FROM, DEFAULT_MAX_ATTEMPTS, DEFAULT_SAMPLE_COUNT, DEFAULT_STEP_DELAY,
};

/// Pacing and size of one enrollment capture session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Accepted samples needed before the request is submitted.
    pub target_samples: usize,
    /// First number shown by the countdown; 0 skips the countdown.
    pub countdown_from: u8,
    pub step_delay_ms: u64,
    /// Capture actions attempted by unattended sessions before giving up.
    pub max_attempts: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            target_samples: DEFAULT_SAMPLE_COUNT,
            countdown_from: COUNTDOWN_FROM,
            step_delay_ms: DEFAULT_STEP_DELAY.as_millis() as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CaptureSettings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}
