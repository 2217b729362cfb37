//! Sharepool Core - Revenue-sharing pool engine.
//!
//! This crate provides:
//! - Power registry fed by qualifying eligibility assets
//! - Deposit split between the operator reserve and the locked balance
//! - Cliff-plus-period vesting from locked to unlocked funds
//! - Proportional withdrawal ledger for members
//! - Reward pulling from an external source with a post-call balance check
//! - Operator reserve withdrawals
//!
//! Every mutating operation on [`Pool`] is all-or-nothing.

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod locked_pool;
pub mod memory;
pub mod operator;
pub mod pool;
pub mod registry;
pub mod rewards;
pub mod vesting;
pub mod withdrawal;

pub use collaborators::{EligibilityState, IdentityOracle, RewardSink, RewardSource, ValueTransfer};
pub use config::{PoolConfig, UnlockPolicy};
pub use context::CallContext;
pub use error::{CollaboratorError, PoolError};
pub use events::PoolEvent;
pub use pool::{MemberSnapshot, Pool, PoolSnapshot, PoolState};
pub use registry::Member;
