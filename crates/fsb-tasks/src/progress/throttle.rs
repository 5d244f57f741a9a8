//! Progress throttling.
//!
//! Rate-limits transfer progress events so a fast upload does not flood
//! the event channel.

use std::time::Duration;

use tokio::time::Instant;

/// Rate-limiter for progress events.
///
/// The first update and the final (`percent >= 1.0`) update always pass.
#[derive(Debug)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Check whether an update at `percent` should be emitted now.
    pub fn should_emit(&mut self, percent: f64) -> bool {
        let now = Instant::now();
        let due = match self.last_emit {
            Some(last) => now.duration_since(last) >= self.min_interval,
            None => true,
        };
        if due || percent >= 1.0 {
            self.last_emit = Some(now);
            return true;
        }
        false
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
