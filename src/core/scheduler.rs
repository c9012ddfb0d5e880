// src/core/scheduler.rs
use crate::connectors::traits::ExchangeGateway;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Time left until the next multiple of `period_secs`, measured from `now`.
///
/// If the boundary is closer than `guard_secs`, the wait rolls over one more
/// period so the decision never reads a candle the exchange has not closed yet.
pub fn until_next_boundary(now: DateTime<Utc>, period_secs: u64, guard_secs: u64) -> Duration {
    let period_ms = period_secs.max(1) as i64 * 1000;
    let now_ms = now.timestamp_millis();
    let mut remaining_ms = period_ms - now_ms.rem_euclid(period_ms);
    if remaining_ms < guard_secs as i64 * 1000 {
        remaining_ms += period_ms;
    }
    Duration::from_millis(remaining_ms as u64)
}

/// Aligns decision cycles to candle closes on the exchange clock.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period_secs: u64,
    guard_secs: u64,
}

impl Scheduler {
    pub fn new(period_secs: u64, guard_secs: u64) -> Self {
        Self {
            period_secs,
            guard_secs,
        }
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    /// Sleeps until the next candle boundary and returns how long it waited.
    ///
    /// Falls back to the local clock when the exchange clock is unreachable.
    pub async fn wait_for_next_boundary<G>(&self, gateway: &G) -> Duration
    where
        G: ExchangeGateway + ?Sized,
    {
        let now = match gateway.server_time().await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Server time unavailable, scheduling on local clock (degraded accuracy)");
                Utc::now()
            }
        };

        let wait = until_next_boundary(now, self.period_secs, self.guard_secs);
        info!(
            server_time = %now.format("%Y-%m-%d %H:%M:%S UTC"),
            wait_secs = wait.as_secs(),
            period_secs = self.period_secs,
            "[Timing] Waiting for next candle close"
        );
        tokio::time::sleep(wait).await;
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_waits_until_next_hour() {
        // 10:15:00 -> 45 minutes to 11:00
        let now = at(10 * 3600 + 15 * 60);
        assert_eq!(until_next_boundary(now, 3600, 10), Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_guard_rolls_over_one_period() {
        // 5 seconds before the close is inside the 10 second guard
        let now = at(11 * 3600 - 5);
        assert_eq!(until_next_boundary(now, 3600, 10), Duration::from_secs(3605));
    }

    #[test]
    fn test_exactly_on_boundary_waits_full_period() {
        let now = at(12 * 3600);
        assert_eq!(until_next_boundary(now, 3600, 10), Duration::from_secs(3600));
    }

    #[test]
    fn test_millisecond_precision() {
        let now = Utc.timestamp_millis_opt(60_000 * 7 + 1_500).unwrap();
        assert_eq!(until_next_boundary(now, 60, 0), Duration::from_millis(58_500));
    }

    #[test]
    fn test_result_never_exceeds_two_periods() {
        for offset in (0..3600).step_by(37) {
            let wait = until_next_boundary(at(1_700_000_000 + offset), 3600, 10);
            assert!(wait >= Duration::from_secs(10));
            assert!(wait <= Duration::from_secs(2 * 3600));
        }
    }
}
