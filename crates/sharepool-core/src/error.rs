use sharepool_types::{Address, Amount, AssetId, RewardAccountId, Timestamp};
use thiserror::Error;

use crate::collaborators::EligibilityState;

/// Errors that can occur in pool operations.
///
/// Every variant aborts the enclosing operation; the pool restores the state it
/// had before the call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoolError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Asset {0} already registered")]
    AlreadyRegistered(AssetId),

    #[error("Asset {asset} is not eligible (state: {state:?})")]
    InvalidState { asset: AssetId, state: EligibilityState },

    #[error("Cliff not reached: unlocks open at {opens_at}, now {now}")]
    CliffNotReached { opens_at: Timestamp, now: Timestamp },

    #[error("Still vesting: next unlock at {next_at}, now {now}")]
    StillVesting { next_at: Timestamp, now: Timestamp },

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Accounting mismatch: {0}")]
    AccountingMismatch(String),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Not a member: {0}")]
    NotAMember(Address),

    #[error("Pool has no members")]
    NoMembers,

    #[error("Unknown reward account: {0}")]
    UnknownRewardAccount(RewardAccountId),

    #[error("Reward account already open: {0}")]
    RewardAccountExists(RewardAccountId),

    #[error("External call failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Failure reported by an external collaborator (identity system, reward
/// source or the host's value transfer).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Transfer of {amount} to {to} rejected: {reason}")]
    TransferRejected { to: Address, amount: Amount, reason: String },

    #[error("Reward source error: {0}")]
    RewardSource(String),

    #[error("Payment of {amount} rejected by recipient")]
    PaymentRejected { amount: Amount },
}

pub type Result<T> = std::result::Result<T, PoolError>;
