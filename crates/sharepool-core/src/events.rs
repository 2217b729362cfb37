//! Events published by committed pool operations.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, Amount, AssetId, RewardAccountId};

/// A pool event. Published exactly once per successful call and never for a
/// reverted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    ReceivedFunds {
        amount: Amount,
        sender: Address,
    },
    MemberRegistered {
        asset_id: AssetId,
        owner: Address,
        is_initial: bool,
    },
    RewardsClaimed {
        reward_account_id: RewardAccountId,
        amount_withdrawn: Amount,
        claimant: Address,
    },
    BalanceWithdrawn {
        amount: Amount,
        sender: Address,
    },
    FundsUnlocked {
        amount: Amount,
        sender: Address,
    },
    RewardAccountOpened {
        reward_account_id: RewardAccountId,
    },
    RewardAccountRecorded {
        reward_account_id: RewardAccountId,
        registrant: Address,
    },
}

impl PoolEvent {
    /// Event name as it appears in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::ReceivedFunds { .. } => "ReceivedFunds",
            PoolEvent::MemberRegistered { .. } => "MemberRegistered",
            PoolEvent::RewardsClaimed { .. } => "RewardsClaimed",
            PoolEvent::BalanceWithdrawn { .. } => "BalanceWithdrawn",
            PoolEvent::FundsUnlocked { .. } => "FundsUnlocked",
            PoolEvent::RewardAccountOpened { .. } => "RewardAccountOpened",
            PoolEvent::RewardAccountRecorded { .. } => "RewardAccountRecorded",
        }
    }
}
