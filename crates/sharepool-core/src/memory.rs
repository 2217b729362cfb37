//! In-memory collaborators.
//!
//! Used by the tests and by the scenario runner of the CLI. They implement the
//! collaborator traits with plain maps and can be told to misbehave.

use sharepool_types::{Address, Amount, AssetId, RewardAccountId};
use std::collections::{HashMap, HashSet};

use crate::collaborators::{EligibilityState, IdentityOracle, RewardSink, RewardSource, ValueTransfer};
use crate::error::CollaboratorError;

/// Identity system backed by an asset table.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityOracle {
    assets: HashMap<AssetId, (Address, EligibilityState)>,
}

impl MemoryIdentityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue (or reassign) `asset` to `owner` in `state`.
    pub fn issue(&mut self, asset: AssetId, owner: Address, state: EligibilityState) {
        self.assets.insert(asset, (owner, state));
    }

    pub fn set_state(&mut self, asset: AssetId, state: EligibilityState) {
        if let Some(entry) = self.assets.get_mut(&asset) {
            entry.1 = state;
        }
    }
}

impl IdentityOracle for MemoryIdentityOracle {
    fn owns_asset(&self, owner: &Address, asset: AssetId) -> bool {
        self.assets.get(&asset).map(|(o, _)| o == owner).unwrap_or(false)
    }

    fn eligibility_state(&self, asset: AssetId) -> EligibilityState {
        self.assets
            .get(&asset)
            .map(|(_, state)| *state)
            .unwrap_or(EligibilityState::Pending)
    }
}

#[derive(Debug, Clone)]
struct RewardAccount {
    beneficiary: Address,
    balance: Amount,
    /// Added to the reported amount on every withdrawal
    misreport: Amount,
}

/// Reward source holding per-account balances.
#[derive(Debug, Clone, Default)]
pub struct MemoryRewardSource {
    accounts: HashMap<RewardAccountId, RewardAccount>,
    next_id: u64,
}

impl MemoryRewardSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account directly, outside any pool call.
    pub fn open(&mut self, beneficiary: Address) -> RewardAccountId {
        let id = RewardAccountId(self.next_id);
        self.next_id += 1;
        self.accounts.insert(
            id,
            RewardAccount {
                beneficiary,
                balance: 0,
                misreport: 0,
            },
        );
        id
    }

    /// Add funds to an account.
    pub fn fund(&mut self, account: RewardAccountId, amount: Amount) {
        if let Some(entry) = self.accounts.get_mut(&account) {
            entry.balance = entry.balance.saturating_add(amount);
        }
    }

    /// Make withdrawals from `account` report `delta` more than they pay.
    pub fn misreport_by(&mut self, account: RewardAccountId, delta: Amount) {
        if let Some(entry) = self.accounts.get_mut(&account) {
            entry.misreport = delta;
        }
    }

    pub fn balance(&self, account: RewardAccountId) -> Amount {
        self.accounts.get(&account).map(|a| a.balance).unwrap_or(0)
    }

    pub fn beneficiary(&self, account: RewardAccountId) -> Option<Address> {
        self.accounts.get(&account).map(|a| a.beneficiary)
    }
}

impl RewardSource for MemoryRewardSource {
    fn register_account(&mut self, beneficiary: Address) -> Result<RewardAccountId, CollaboratorError> {
        Ok(self.open(beneficiary))
    }

    fn withdraw(
        &mut self,
        account: RewardAccountId,
        recipient: &mut dyn RewardSink,
        amount: Amount,
    ) -> Result<Amount, CollaboratorError> {
        let entry = self
            .accounts
            .get_mut(&account)
            .ok_or_else(|| CollaboratorError::RewardSource(format!("no such account {}", account)))?;

        let paid = amount.min(entry.balance);
        recipient.receive(paid)?;
        entry.balance -= paid;
        tracing::debug!(%account, recipient = %recipient.address(), paid, "reward account debited");

        Ok(paid.saturating_add(entry.misreport))
    }
}

/// Host ledger recording every payout made by the pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryBank {
    balances: HashMap<Address, Amount>,
    rejecting: HashSet<Address>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make transfers to `address` fail.
    pub fn reject_transfers_to(&mut self, address: Address) {
        self.rejecting.insert(address);
    }

    pub fn accept_transfers_to(&mut self, address: &Address) {
        self.rejecting.remove(address);
    }

    /// Total received by `address`.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }
}

impl ValueTransfer for MemoryBank {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), CollaboratorError> {
        if self.rejecting.contains(&to) {
            return Err(CollaboratorError::TransferRejected {
                to,
                amount,
                reason: "recipient refuses payments".to_string(),
            });
        }

        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}
