use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning options for one page run.
///
/// `target_quality` pins the stream to a specific label; leave it empty to
/// always take the first (best) entry the player offers. The remaining
/// fields bound the retry machinery and the settle pause after a switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PilotConfig {
    pub target_quality: String,
    pub retry_times: u32,
    pub retry_delay_ms: u64,
    pub quality_switch_delay_ms: u64,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            target_quality: "蓝光8M".to_string(),
            retry_times: 3,
            retry_delay_ms: 1000,
            quality_switch_delay_ms: 800,
        }
    }
}

impl PilotConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn quality_switch_delay(&self) -> Duration {
        Duration::from_millis(self.quality_switch_delay_ms)
    }
}
