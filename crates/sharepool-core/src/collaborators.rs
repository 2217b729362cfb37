//! Interfaces of the systems the pool talks to.
//!
//! The pool never owns these collaborators; each operation borrows the ones it
//! needs for the duration of the call.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, Amount, AssetId, RewardAccountId};

use crate::error::CollaboratorError;

/// Lifecycle state of an eligibility asset at the identity system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityState {
    /// Not settled yet
    Pending,
    /// Settled, does not grant membership
    Failed,
    /// Settled, grants membership
    Qualified,
}

/// Read-only view of the identity system that issues eligibility assets.
pub trait IdentityOracle {
    /// Whether `owner` currently holds `asset`.
    fn owns_asset(&self, owner: &Address, asset: AssetId) -> bool;

    /// Current eligibility state of `asset`.
    fn eligibility_state(&self, asset: AssetId) -> EligibilityState;
}

/// Receiving end handed to the reward source while it pays out a claim.
pub trait RewardSink {
    /// Address funds are paid to.
    fn address(&self) -> Address;

    /// Accept `amount` from the reward source.
    fn receive(&mut self, amount: Amount) -> Result<(), CollaboratorError>;
}

/// External source of supplementary funds.
pub trait RewardSource {
    /// Open an account for `beneficiary` and return its id.
    fn register_account(&mut self, beneficiary: Address) -> Result<RewardAccountId, CollaboratorError>;

    /// Pay up to `amount` from `account` into `recipient`.
    ///
    /// Returns the amount actually withdrawn.
    fn withdraw(
        &mut self,
        account: RewardAccountId,
        recipient: &mut dyn RewardSink,
        amount: Amount,
    ) -> Result<Amount, CollaboratorError>;
}

/// Host primitive that moves value out of the pool.
pub trait ValueTransfer {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), CollaboratorError>;
}
