// Page settle strategy

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::driver::{DriverError, SessionDriver};

/// How the workflow waits after a click that changes the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Sleep a fixed amount after every page change
    FixedDelay(Duration),
    /// Wait (bounded) for the element the next action needs
    EventWait(Duration),
}

impl WaitPolicy {
    /// Settle after a page change; `next` is the selector the next action targets
    pub async fn settle<D: SessionDriver>(
        &self,
        driver: &D,
        next: Option<&str>,
    ) -> Result<(), DriverError> {
        match (self, next) {
            (WaitPolicy::FixedDelay(delay), _) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            (WaitPolicy::EventWait(timeout), Some(selector)) => {
                driver.wait_for(selector, *timeout).await
            }
            (WaitPolicy::EventWait(_), None) => Ok(()),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::EventWait(Duration::from_secs(5))
    }
}

/// `[wait]` configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// "event" or "fixed"
    pub policy: String,
    /// Sleep used by the fixed policy
    pub delay_ms: u64,
    /// Upper bound for each event wait
    pub timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            policy: "event".to_string(),
            delay_ms: 1500,
            timeout_secs: 5,
        }
    }
}

impl WaitConfig {
    pub fn to_policy(&self) -> anyhow::Result<WaitPolicy> {
        match self.policy.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(WaitPolicy::EventWait(Duration::from_secs(self.timeout_secs))),
            "fixed" => Ok(WaitPolicy::FixedDelay(Duration::from_millis(self.delay_ms))),
            other => anyhow::bail!("Unknown wait policy '{}' (expected \"event\" or \"fixed\")", other),
        }
    }
}
