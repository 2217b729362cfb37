//! Identifiers issued by the pool's external collaborators.

use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// Identifier of an eligibility asset issued by the identity system.
///
/// Each asset id can be consumed for a power grant at most once.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct AssetId(pub u64);

/// Identifier of an account held at the external reward source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct RewardAccountId(pub u64);

impl AssetId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl RewardAccountId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

impl fmt::Display for RewardAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reward#{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("asset#").unwrap_or(s);
        Ok(Self(digits.parse()?))
    }
}

impl FromStr for RewardAccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("reward#").unwrap_or(s);
        Ok(Self(digits.parse()?))
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for RewardAccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
