//! Membership and power registry.
//!
//! Power is granted by consuming a qualifying eligibility asset. Each asset
//! id is consumed at most once; a member's own power is set to 1 on the first
//! grant and never changes afterwards, while every consumed asset adds 1 to
//! the total.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, AssetId};
use std::collections::{HashMap, HashSet};

use crate::collaborators::{EligibilityState, IdentityOracle};
use crate::error::{PoolError, Result};

/// Power granted to a first-time member.
pub const INITIAL_POWER: u64 = 1;

/// Registered member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub power: u64,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub asset: AssetId,
    pub owner: Address,
    /// Whether this registration created the member
    pub is_initial: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerRegistry {
    members: HashMap<Address, Member>,
    registered_assets: HashSet<AssetId>,
    total_power: u64,
    member_count: u64,
}

impl PowerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `asset` for a power grant to `requester`.
    ///
    /// # Errors
    /// - `Unauthorized` if `requester` does not hold `asset`
    /// - `InvalidState` if the asset is not `Qualified`
    /// - `AlreadyRegistered` if the asset was consumed before
    pub fn register(
        &mut self,
        oracle: &dyn IdentityOracle,
        asset: AssetId,
        requester: Address,
    ) -> Result<Registration> {
        if !oracle.owns_asset(&requester, asset) {
            return Err(PoolError::Unauthorized(format!(
                "{} does not own {}",
                requester, asset
            )));
        }

        let state = oracle.eligibility_state(asset);
        if state != EligibilityState::Qualified {
            return Err(PoolError::InvalidState { asset, state });
        }

        if self.registered_assets.contains(&asset) {
            return Err(PoolError::AlreadyRegistered(asset));
        }

        let total_power = self
            .total_power
            .checked_add(1)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let is_initial = self.power_of(&requester) == 0;
        if is_initial {
            let member_count = self
                .member_count
                .checked_add(1)
                .ok_or(PoolError::ArithmeticOverflow)?;
            self.members.insert(
                requester,
                Member {
                    address: requester,
                    power: INITIAL_POWER,
                },
            );
            self.member_count = member_count;
        }

        self.total_power = total_power;
        self.registered_assets.insert(asset);

        tracing::debug!(%asset, owner = %requester, is_initial, total_power, "asset consumed for power");

        Ok(Registration {
            asset,
            owner: requester,
            is_initial,
        })
    }

    /// Power held by `address` (zero for non-members).
    pub fn power_of(&self, address: &Address) -> u64 {
        self.members.get(address).map(|m| m.power).unwrap_or(0)
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.power_of(address) > 0
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.members.get(address)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn is_asset_registered(&self, asset: AssetId) -> bool {
        self.registered_assets.contains(&asset)
    }

    pub fn total_power(&self) -> u64 {
        self.total_power
    }

    pub fn member_count(&self) -> u64 {
        self.member_count
    }
}
