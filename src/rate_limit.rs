//! Per-session admission control.
//!
//! A fixed-window counter: each session may issue `throttle` queries per
//! window of length `period`. The window only restarts once a query arrives
//! strictly after `period` has elapsed, so bursts across a window edge are
//! allowed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;
use thiserror::Error;
use tracing::debug;

use crate::session::{SessionId, SessionTable};

/// Request count of one session within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub start: Instant,
}

impl RateWindow {
    fn open(now: Instant) -> Self {
        Self { count: 1, start: now }
    }

    fn admit(&mut self, now: Instant, throttle: u32, period: Duration) -> Result<(), Rejected> {
        if now.saturating_duration_since(self.start) > period {
            *self = Self::open(now);
            return Ok(());
        }
        if self.count >= throttle {
            return Err(Rejected);
        }
        self.count += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("403 Forbidden")]
pub struct Rejected;

#[derive(Debug)]
pub struct RateLimiter {
    throttle: u32,
    period: Duration,
    windows: SessionTable,
}

impl RateLimiter {
    pub fn new(throttle: u32, period: Duration, windows: SessionTable) -> Self {
        Self {
            throttle,
            period,
            windows,
        }
    }

    /// Counts one query for `session` at `now`, or rejects it without
    /// touching the session's window.
    pub fn check(&self, session: SessionId, now: Instant) -> Result<(), Rejected> {
        let mut windows = self.lock();
        let verdict = match windows.entry(session) {
            Entry::Vacant(slot) => {
                slot.insert(RateWindow::open(now));
                Ok(())
            }
            Entry::Occupied(mut slot) => slot.get_mut().admit(now, self.throttle, self.period),
        };
        drop(windows);

        if verdict.is_err() {
            debug!(session = %session, throttle = self.throttle, "query throttled");
        }
        verdict
    }

    pub fn window(&self, session: SessionId) -> Option<RateWindow> {
        self.lock().get(&session).copied()
    }

    pub fn tracked_sessions(&self) -> usize {
        self.lock().len()
    }

    pub fn throttle(&self) -> u32 {
        self.throttle
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, RateWindow>> {
        self.windows.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(1);

    fn limiter(throttle: u32) -> RateLimiter {
        RateLimiter::new(throttle, PERIOD, SessionRegistry::new().windows())
    }

    fn seeded(throttle: u32, session: SessionId, window: RateWindow) -> RateLimiter {
        let limiter = limiter(throttle);
        limiter.lock().insert(session, window);
        limiter
    }

    #[test]
    fn test_first_query_opens_window() {
        let limiter = limiter(2);
        let session = SessionId::new(1);
        let now = Instant::now();

        assert_eq!(limiter.window(session), None);
        assert!(limiter.check(session, now).is_ok());
        assert_eq!(limiter.window(session), Some(RateWindow { count: 1, start: now }));
    }

    #[test]
    fn test_fixed_window_table() {
        let session = SessionId::new(1);
        let now = Instant::now();
        let later = now + Duration::from_secs(10);

        let cases = [
            (1, now, true),
            (2, now, false),
            (3, now, false),
            (1, later, true),
            (2, later, true),
            (3, later, true),
        ];

        for (count, at, admitted) in cases {
            let limiter = seeded(2, session, RateWindow { count, start: now });
            assert_eq!(
                limiter.check(session, at).is_ok(),
                admitted,
                "count={} elapsed={:?}",
                count,
                at - now
            );
        }
    }

    #[test]
    fn test_throttle_plus_one_is_rejected() {
        let limiter = limiter(30);
        let session = SessionId::new(4);
        let now = Instant::now();

        for n in 1..=30 {
            assert!(limiter.check(session, now).is_ok(), "query {} should pass", n);
        }
        assert_eq!(limiter.check(session, now), Err(Rejected));
    }

    #[test]
    fn test_elapsed_equal_to_period_stays_in_window() {
        let session = SessionId::new(1);
        let start = Instant::now();
        let limiter = seeded(2, session, RateWindow { count: 2, start });

        assert_eq!(limiter.check(session, start + PERIOD), Err(Rejected));

        let limiter = seeded(2, session, RateWindow { count: 1, start });
        assert!(limiter.check(session, start + PERIOD).is_ok());
        assert_eq!(limiter.window(session), Some(RateWindow { count: 2, start }));
    }

    #[test]
    fn test_elapsed_past_period_resets() {
        let session = SessionId::new(1);
        let start = Instant::now();
        let limiter = seeded(2, session, RateWindow { count: 2, start });
        let now = start + PERIOD + Duration::from_nanos(1);

        assert!(limiter.check(session, now).is_ok());
        assert_eq!(limiter.window(session), Some(RateWindow { count: 1, start: now }));
    }

    #[test]
    fn test_rejection_leaves_window_untouched() {
        let session = SessionId::new(1);
        let start = Instant::now();
        let limiter = seeded(2, session, RateWindow { count: 2, start });

        for offset in [0, 200, 999] {
            let now = start + Duration::from_millis(offset);
            assert_eq!(limiter.check(session, now), Err(Rejected));
            assert_eq!(limiter.window(session), Some(RateWindow { count: 2, start }));
        }
    }

    #[test]
    fn test_burst_across_window_edge() {
        let limiter = limiter(3);
        let session = SessionId::new(1);
        let start = Instant::now();
        let edge = start + PERIOD;
        let after = edge + Duration::from_millis(1);

        assert!(limiter.check(session, start).is_ok());
        assert!(limiter.check(session, edge).is_ok());
        assert!(limiter.check(session, edge).is_ok());
        assert!(limiter.check(session, after).is_ok());
        assert!(limiter.check(session, after).is_ok());
        assert!(limiter.check(session, after).is_ok());
        assert_eq!(limiter.check(session, after), Err(Rejected));
    }

    #[test]
    fn test_sessions_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();
        let (a, b) = (SessionId::new(1), SessionId::new(2));

        assert!(limiter.check(a, now).is_ok());
        assert_eq!(limiter.check(a, now), Err(Rejected));
        assert!(limiter.check(b, now).is_ok());
        assert_eq!(limiter.check(b, now), Err(Rejected));
        assert_eq!(limiter.window(a).map(|w| w.count), Some(1));
        assert_eq!(limiter.tracked_sessions(), 2);
    }

    #[test]
    fn test_concurrent_sessions_count_exactly() {
        let limiter = Arc::new(limiter(50));
        let now = Instant::now();

        let admitted: Vec<(u64, usize)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=8u64)
                .flat_map(|id| std::iter::repeat(id).take(4))
                .map(|id| {
                    let limiter = Arc::clone(&limiter);
                    let handle = scope.spawn(move || {
                        let session = SessionId::new(id);
                        (0..25)
                            .filter(|_| limiter.check(session, now).is_ok())
                            .count()
                    });
                    (id, handle)
                })
                .collect();
            handles
                .into_iter()
                .map(|(id, handle)| (id, handle.join().unwrap()))
                .collect()
        });

        // 100 attempts per session against a throttle of 50.
        for id in 1..=8u64 {
            let total: usize = admitted
                .iter()
                .filter(|(session, _)| *session == id)
                .map(|(_, n)| n)
                .sum();
            assert_eq!(total, 50);
            assert_eq!(limiter.window(SessionId::new(id)).unwrap().count, 50);
        }
        assert_eq!(limiter.tracked_sessions(), 8);
    }
}
