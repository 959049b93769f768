//! Timers for bingo-hall room actors.
//!
//! Rooms are event-driven: nothing happens between player events except
//! two kinds of scheduled work.
//!
//! - [`DeadlineTimer`]: a single pending one-shot, tagged with an *epoch*.
//!   Used to close letter votes. The epoch comes back when the timer fires,
//!   so the room can tell whether the vote it was armed for is still the
//!   one running.
//! - [`SweepInterval`]: a slow periodic tick used to check whether an idle
//!   room should shut down.
//!
//! Both are meant to sit inside a room actor's `tokio::select!` loop and
//! pend forever when there is nothing to do:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         fired = vote_timer.wait() => room.resolve_vote(fired.epoch),
//!         _ = sweep.tick() => { /* idle check */ }
//!     }
//! }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// DeadlineTimer
// ---------------------------------------------------------------------------

/// Returned by [`DeadlineTimer::wait`] when the armed deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    /// The epoch the timer was armed with.
    pub epoch: u64,
    /// How far past the deadline the timer was actually observed.
    pub late_by: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    epoch: u64,
    deadline: Instant,
}

/// A one-shot timer holding at most one pending deadline.
///
/// Arming again replaces the pending deadline. There is no way to have two
/// outstanding firings, so a room can never resolve the same vote twice
/// through this timer.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    armed: Option<Armed>,
}

impl DeadlineTimer {
    /// Creates an unarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire `after` from now, tagged with `epoch`.
    ///
    /// Returns the deadline.
    pub fn arm(&mut self, epoch: u64, after: Duration) -> Instant {
        let deadline = Instant::now() + after;
        self.arm_at(epoch, deadline);
        deadline
    }

    /// Arms the timer for an absolute deadline.
    pub fn arm_at(&mut self, epoch: u64, deadline: Instant) {
        if let Some(previous) = self.armed {
            debug!(
                previous_epoch = previous.epoch,
                epoch, "replacing pending deadline"
            );
        }
        self.armed = Some(Armed { epoch, deadline });
        trace!(epoch, "deadline armed");
    }

    /// Clears any pending deadline. Returns the epoch that was pending.
    pub fn disarm(&mut self) -> Option<u64> {
        self.armed.take().map(|a| a.epoch)
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The epoch of the pending deadline, if any.
    pub fn pending_epoch(&self) -> Option<u64> {
        self.armed.map(|a| a.epoch)
    }

    /// The pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.deadline)
    }

    /// Waits for the pending deadline, then disarms and returns it.
    ///
    /// Pends forever while unarmed. Cancel-safe: dropping the future before
    /// it resolves leaves the timer armed.
    pub async fn wait(&mut self) -> Fired {
        let Some(armed) = self.armed else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(armed.deadline).await;
        let late_by = Instant::now().saturating_duration_since(armed.deadline);
        if late_by > Duration::from_secs(1) {
            warn!(
                epoch = armed.epoch,
                late_ms = late_by.as_millis() as u64,
                "deadline fired late"
            );
        }

        self.armed = None;
        trace!(epoch = armed.epoch, "deadline fired");
        Fired {
            epoch: armed.epoch,
            late_by,
        }
    }
}

// ---------------------------------------------------------------------------
// SweepInterval
// ---------------------------------------------------------------------------

/// A periodic tick for housekeeping. A zero period disables it.
///
/// Missed ticks are skipped rather than replayed in a burst.
pub struct SweepInterval {
    interval: Option<Interval>,
    period: Duration,
    count: u64,
}

impl SweepInterval {
    /// Creates an interval whose first tick is one `period` from now.
    pub fn new(period: Duration) -> Self {
        let interval = if period.is_zero() {
            debug!("sweep interval disabled");
            None
        } else {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            Some(interval)
        };
        Self {
            interval,
            period,
            count: 0,
        }
    }

    /// Waits for the next tick and returns the running tick count.
    ///
    /// Pends forever when disabled.
    pub async fn tick(&mut self) -> u64 {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.count += 1;
                self.count
            }
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the interval ever fires.
    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }
}

// ---------------------------------------------------------------------------
// Wall clock
// ---------------------------------------------------------------------------

/// Unix time in milliseconds, `after` from now.
///
/// Deadlines are shown to browsers, which count down against their own
/// wall clock, so they travel as Unix milliseconds rather than `Instant`s.
pub fn unix_millis_after(after: Duration) -> u64 {
    let at = SystemTime::now() + after;
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
