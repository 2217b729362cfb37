//! Sharepool Types - Core type definitions shared by the pool engine and its tools.
//!
//! This crate provides:
//! - Addresses (20-byte, Bech32m encoded with the `pool` prefix)
//! - Identifiers for eligibility assets and reward accounts
//! - Amount and timestamp aliases used by every ledger

pub mod address;
pub mod ids;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use address::Address;
pub use ids::{AssetId, RewardAccountId};
pub use error::TypesError;

/// Value amounts. All ledger arithmetic on this type must be checked.
pub type Amount = u128;

/// Seconds since the Unix epoch, as supplied by the host.
pub type Timestamp = u64;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Amount, AssetId, RewardAccountId, Timestamp, TypesError};
}
