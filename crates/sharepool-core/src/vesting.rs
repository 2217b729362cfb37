//! Cliff-plus-period vesting.
//!
//! Unlocks are never scheduled by the pool itself; a member triggers one and
//! the scheduler checks whether the gates are open at that moment.

use serde::{Deserialize, Serialize};
use sharepool_types::{Amount, Timestamp};

use crate::config::UnlockPolicy;
use crate::error::{PoolError, Result};
use crate::locked_pool::{percent_of, LockedPool};

/// Vesting schedule state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingScheduler {
    start_time: Timestamp,
    /// Zero until the first recurring unlock.
    last_unlock_time: Timestamp,
    cliff_duration: u64,
    period_duration: u64,
    unlock_percent: u8,
    policy: UnlockPolicy,
    unlock_count: u64,
}

impl VestingScheduler {
    pub fn new(
        start_time: Timestamp,
        cliff_duration: u64,
        period_duration: u64,
        unlock_percent: u8,
        policy: UnlockPolicy,
    ) -> Self {
        Self {
            start_time,
            last_unlock_time: 0,
            cliff_duration,
            period_duration,
            unlock_percent,
            policy,
            unlock_count: 0,
        }
    }

    /// First moment an unlock is allowed.
    pub fn cliff_end(&self) -> Result<Timestamp> {
        self.start_time
            .checked_add(self.cliff_duration)
            .ok_or(PoolError::ArithmeticOverflow)
    }

    /// Earliest moment the period gate opens again.
    pub fn next_period_start(&self) -> Result<Timestamp> {
        self.last_unlock_time
            .checked_add(self.period_duration)
            .ok_or(PoolError::ArithmeticOverflow)
    }

    /// Check both gates at `now`.
    ///
    /// # Errors
    /// - `CliffNotReached` before `start_time + cliff_duration`
    /// - `StillVesting` before `last_unlock_time + period_duration`, or after
    ///   the single allowed unlock under [`UnlockPolicy::OneShot`]
    pub fn ensure_open(&self, now: Timestamp) -> Result<()> {
        let opens_at = self.cliff_end()?;
        if now < opens_at {
            return Err(PoolError::CliffNotReached { opens_at, now });
        }

        let next_at = self.next_period_start()?;
        if now < next_at {
            return Err(PoolError::StillVesting { next_at, now });
        }

        if self.policy == UnlockPolicy::OneShot && self.unlock_count > 0 {
            return Err(PoolError::StillVesting { next_at: Timestamp::MAX, now });
        }

        Ok(())
    }

    /// Release `unlock_percent` of the locked balance.
    ///
    /// Returns the amount moved to the unlocked balance.
    pub fn unlock(&mut self, balances: &mut LockedPool, now: Timestamp) -> Result<Amount> {
        self.ensure_open(now)?;

        let amount = percent_of(balances.locked_balance(), self.unlock_percent)?;
        let unlock_count = self
            .unlock_count
            .checked_add(1)
            .ok_or(PoolError::ArithmeticOverflow)?;

        balances.release(amount)?;

        self.unlock_count = unlock_count;
        if self.policy == UnlockPolicy::Recurring {
            self.last_unlock_time = now;
        }

        tracing::debug!(amount, now, unlock_count, "vesting unlock");

        Ok(amount)
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn last_unlock_time(&self) -> Timestamp {
        self.last_unlock_time
    }

    pub fn cliff_duration(&self) -> u64 {
        self.cliff_duration
    }

    pub fn period_duration(&self) -> u64 {
        self.period_duration
    }

    pub fn unlock_percent(&self) -> u8 {
        self.unlock_percent
    }

    pub fn policy(&self) -> UnlockPolicy {
        self.policy
    }

    pub fn unlock_count(&self) -> u64 {
        self.unlock_count
    }
}
