//! Pool balances and the deposit split.

use serde::{Deserialize, Serialize};
use sharepool_types::Amount;

use crate::error::{PoolError, Result};

/// `floor(amount * percent / 100)` with overflow checking.
pub fn percent_of(amount: Amount, percent: u8) -> Result<Amount> {
    amount
        .checked_mul(Amount::from(percent))
        .map(|scaled| scaled / 100)
        .ok_or(PoolError::ArithmeticOverflow)
}

/// Result of splitting one deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositSplit {
    pub operator_share: Amount,
    pub locked_share: Amount,
}

/// Balances held by the pool.
///
/// `unlocked_balance` is the running total of everything ever released and
/// never decreases; withdrawals are tracked per member by the withdrawal
/// ledger instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPool {
    operator_reserve: Amount,
    locked_balance: Amount,
    unlocked_balance: Amount,
}

impl LockedPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split an incoming payment between the operator reserve and the locked
    /// balance. The rounding remainder stays with the locked balance.
    pub fn deposit(&mut self, amount: Amount, team_split_percent: u8) -> Result<DepositSplit> {
        if amount == 0 {
            return Ok(DepositSplit { operator_share: 0, locked_share: 0 });
        }

        let operator_share = percent_of(amount, team_split_percent)?;
        let locked_share = amount - operator_share;

        let operator_reserve = self
            .operator_reserve
            .checked_add(operator_share)
            .ok_or(PoolError::ArithmeticOverflow)?;
        let locked_balance = self
            .locked_balance
            .checked_add(locked_share)
            .ok_or(PoolError::ArithmeticOverflow)?;

        self.operator_reserve = operator_reserve;
        self.locked_balance = locked_balance;

        Ok(DepositSplit { operator_share, locked_share })
    }

    /// Credit funds straight to the locked balance, with no operator share.
    pub fn credit_locked(&mut self, amount: Amount) -> Result<()> {
        self.locked_balance = self
            .locked_balance
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Move `amount` from locked to unlocked.
    pub fn release(&mut self, amount: Amount) -> Result<()> {
        let locked_balance = self.locked_balance.checked_sub(amount).ok_or_else(|| {
            PoolError::AccountingMismatch(format!(
                "release of {} exceeds locked balance {}",
                amount, self.locked_balance
            ))
        })?;
        let unlocked_balance = self
            .unlocked_balance
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;

        self.locked_balance = locked_balance;
        self.unlocked_balance = unlocked_balance;
        Ok(())
    }

    /// Take `amount` out of the operator reserve.
    pub fn debit_operator_reserve(&mut self, amount: Amount) -> Result<()> {
        self.operator_reserve = self.operator_reserve.checked_sub(amount).ok_or(
            PoolError::InsufficientFunds {
                requested: amount,
                available: self.operator_reserve,
            },
        )?;
        Ok(())
    }

    pub fn operator_reserve(&self) -> Amount {
        self.operator_reserve
    }

    pub fn locked_balance(&self) -> Amount {
        self.locked_balance
    }

    pub fn unlocked_balance(&self) -> Amount {
        self.unlocked_balance
    }
}
