// Wall clock and waiting discipline

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::time::Duration;
use tracing::{debug, info};

/// Source of local wall-clock time plus a way to sleep
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Local time and tokio sleeps
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

const COARSE: Duration = Duration::from_secs(600);
const MEDIUM: Duration = Duration::from_secs(60);
const FINE: Duration = Duration::from_secs(1);

/// Next sleep while `remaining` is left: 10 min, then 1 min, then 1 s,
/// never longer than `remaining` itself
pub fn poll_interval(remaining: Duration) -> Duration {
    let step = if remaining > COARSE {
        COARSE
    } else if remaining > MEDIUM {
        MEDIUM
    } else {
        FINE
    };
    step.min(remaining)
}

/// Sleep until the clock reads `target` or later
pub async fn wait_until<C: Clock + ?Sized>(clock: &C, target: NaiveDateTime) {
    loop {
        let now = clock.now();
        if now >= target {
            return;
        }

        let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
        let interval = poll_interval(remaining);
        if interval == COARSE {
            info!("Next trigger at {} (in {})", target, format_remaining(remaining));
        } else {
            debug!(remaining_secs = remaining.as_secs(), "Waiting for trigger");
        }

        clock.sleep(interval.max(Duration::from_millis(1))).await;
    }
}

/// `1h 02m 03s` style rendering
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
