//! Exponential backoff for presence reconnection.

use std::time::Duration;

use tracing::{info, warn};

use fusion_presence::{PresenceError, PresenceSink};

const BASE_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_millis(30_000);
const MAX_ATTEMPTS: u32 = 10;

/// Tracks consecutive failed connection attempts. The delay doubles from
/// one second up to the cap; after [`MAX_ATTEMPTS`] failures the schedule
/// is exhausted until [`Reconnect::reset`].
#[derive(Debug, Default)]
pub struct Reconnect {
    attempts: u32,
}

impl Reconnect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the next attempt, or `None` once the schedule is
    /// exhausted. Each call consumes one attempt.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        let delay = delay_for_attempt(self.attempts);
        self.attempts += 1;
        Some(delay)
    }

    /// Called after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

fn delay_for_attempt(attempt: u32) -> Duration {
    let millis = (BASE_DELAY.as_millis() as u64) << attempt.min(16);
    Duration::from_millis(millis).min(MAX_DELAY)
}

/// Drive connection attempts until one succeeds or the schedule runs out.
/// The first attempt happens immediately; each failure sleeps the scheduled
/// delay before the next try.
pub async fn connect_with_backoff<S: PresenceSink>(
    sink: &mut S,
) -> Result<(), PresenceError> {
    let mut schedule = Reconnect::new();
    loop {
        match sink.connect().await {
            Ok(()) => {
                info!("presence connection established");
                return Ok(());
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => match schedule.next_delay() {
                Some(delay) => {
                    warn!(error = %err, delay_ms = delay.as_millis() as u64, "connect failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            },
        }
    }
}
