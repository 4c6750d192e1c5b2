//! Period scheduling and commit-window enforcement

use crate::error::OracleError;
use crate::Result;
use common::AssetPair;

/// Canonical period boundary a commit made at `timestamp` is measured against.
///
/// With `rem = timestamp % period`: below half a period the boundary is
/// `timestamp - rem + period`, otherwise `timestamp + rem + period`. The
/// upper branch does not round to a multiple of `period`. Saturates at
/// `u64::MAX`.
pub fn top_of_period(timestamp: u64, period: u64) -> u64 {
    debug_assert!(period > 0);
    let rem = timestamp % period;
    if rem < period / 2 {
        (timestamp - rem).saturating_add(period)
    } else {
        timestamp.saturating_add(rem).saturating_add(period)
    }
}

/// Decides when a pool may accept its next commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodScheduler {
    period: u64,
    commit_phase_duration: u64,
}

impl PeriodScheduler {
    pub fn new(period: u64, commit_phase_duration: u64) -> Self {
        Self {
            period,
            commit_phase_duration,
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn commit_phase_duration(&self) -> u64 {
        self.commit_phase_duration
    }

    pub fn top_of_period(&self, timestamp: u64) -> u64 {
        top_of_period(timestamp, self.period)
    }

    /// Earliest timestamp at which the commit following `last_commit` is accepted.
    /// Always later than `last_commit`.
    pub fn commit_window_opens_at(&self, last_commit: u64) -> u64 {
        self.top_of_period(last_commit)
            .saturating_sub(self.commit_phase_duration)
            .max(last_commit.saturating_add(1))
    }

    pub fn is_commit_window_open(&self, last_commit: u64, now: u64) -> bool {
        now >= self.commit_window_opens_at(last_commit)
    }

    /// Zero once the window is open
    pub fn seconds_until_window(&self, last_commit: u64, now: u64) -> u64 {
        self.commit_window_opens_at(last_commit).saturating_sub(now)
    }

    /// Reject a commit for `pair` attempted before its window opens
    pub fn check_commit(&self, pair: &AssetPair, last_commit: u64, now: u64) -> Result<()> {
        let opens_at = self.commit_window_opens_at(last_commit);
        if now < opens_at {
            return Err(OracleError::TooEarly {
                pair: pair.clone(),
                now,
                opens_at,
            });
        }
        Ok(())
    }
}
