//! Pulling supplementary funds from the external reward source.
//!
//! The pool accepts claims against at most two reward accounts: its own,
//! opened at the source by the operator, and one recorded by the minting
//! system that owns the pool. Funds arrive through a sink that can only credit
//! the locked balance, and the locked balance must have grown by exactly what
//! the source reports.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, Amount, RewardAccountId};

use crate::collaborators::{RewardSink, RewardSource};
use crate::error::{CollaboratorError, PoolError, Result};
use crate::locked_pool::LockedPool;

/// Sink handed to the reward source during a claim.
struct LockedInbox<'a> {
    address: Address,
    balances: &'a mut LockedPool,
    failure: Option<PoolError>,
}

impl RewardSink for LockedInbox<'_> {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&mut self, amount: Amount) -> std::result::Result<(), CollaboratorError> {
        match self.balances.credit_locked(amount) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.failure = Some(e);
                Err(CollaboratorError::PaymentRejected { amount })
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPuller {
    own_account: Option<RewardAccountId>,
    recorded_account: Option<RewardAccountId>,
    registrant: Option<Address>,
}

impl RewardPuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether claims against `account` are accepted.
    pub fn accepts(&self, account: RewardAccountId) -> bool {
        self.own_account == Some(account) || self.recorded_account == Some(account)
    }

    /// Open the pool's own account at the reward source.
    pub fn open_account(&mut self, source: &mut dyn RewardSource, pool_address: Address) -> Result<RewardAccountId> {
        if let Some(existing) = self.own_account {
            return Err(PoolError::RewardAccountExists(existing));
        }

        let account = source.register_account(pool_address)?;
        self.own_account = Some(account);
        Ok(account)
    }

    /// Record the account the owning minting system opened for this pool.
    ///
    /// The first caller becomes the registrant; later calls must come from it.
    pub fn record_account(&mut self, caller: Address, owner: Address, account: RewardAccountId) -> Result<()> {
        let authorized = match self.registrant {
            Some(registrant) => registrant == caller,
            None => caller == owner,
        };
        if !authorized {
            return Err(PoolError::Unauthorized(format!(
                "{} may not record reward accounts",
                caller
            )));
        }

        self.recorded_account = Some(account);
        self.registrant = Some(caller);
        Ok(())
    }

    /// Pull `amount` from `account` into the locked balance.
    ///
    /// Returns the amount the source reports as withdrawn.
    ///
    /// # Errors
    /// - `UnknownRewardAccount` for an account the pool does not accept
    /// - `AccountingMismatch` if the locked balance did not grow by exactly the
    ///   reported amount
    pub fn claim(
        &self,
        source: &mut dyn RewardSource,
        balances: &mut LockedPool,
        pool_address: Address,
        account: RewardAccountId,
        amount: Amount,
    ) -> Result<Amount> {
        if !self.accepts(account) {
            return Err(PoolError::UnknownRewardAccount(account));
        }

        let before = balances.locked_balance();

        let (outcome, failure) = {
            let mut inbox = LockedInbox {
                address: pool_address,
                balances: &mut *balances,
                failure: None,
            };
            let outcome = source.withdraw(account, &mut inbox, amount);
            (outcome, inbox.failure)
        };

        if let Some(e) = failure {
            return Err(e);
        }
        let withdrawn = outcome?;

        let after = balances.locked_balance();
        let expected = before
            .checked_add(withdrawn)
            .ok_or(PoolError::ArithmeticOverflow)?;
        if after != expected {
            return Err(PoolError::AccountingMismatch(format!(
                "locked balance moved from {} to {} but source reported {}",
                before, after, withdrawn
            )));
        }

        Ok(withdrawn)
    }

    pub fn own_account(&self) -> Option<RewardAccountId> {
        self.own_account
    }

    pub fn recorded_account(&self) -> Option<RewardAccountId> {
        self.recorded_account
    }

    pub fn registrant(&self) -> Option<Address> {
        self.registrant
    }
}
