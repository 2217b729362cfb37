//! Pool configuration.
//!
//! Construction parameters are fixed for the lifetime of a pool. They are
//! loaded from TOML and validated before a pool is built from them.

use serde::{Deserialize, Serialize};
use sharepool_types::Address;
use std::path::Path;

use crate::error::{PoolError, Result};

const SECONDS_PER_DAY: u64 = 86_400;

/// How the vesting scheduler treats `last_unlock_time` after an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnlockPolicy {
    /// `last_unlock_time` advances to `now` after every unlock, so one unlock
    /// is allowed per period.
    #[default]
    Recurring,
    /// `last_unlock_time` is never reassigned and only the first unlock
    /// succeeds.
    OneShot,
}

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Seconds after the pool start before the first unlock
    pub cliff_duration: u64,
    /// Minimum seconds between two unlocks
    pub period_duration: u64,
    /// Percentage of the locked balance released per unlock (1-99)
    pub unlock_percent: u8,
    /// Percentage of every deposit reserved for the operator (1-99)
    pub team_split_percent: u8,
    /// Operator allowed to withdraw the reserve
    pub operator: Address,
    /// Minting system allowed to record a reward account
    pub owner: Address,
    /// Address of the pool itself, used as beneficiary at the reward source
    pub pool_address: Address,
    /// Unlock gating behaviour
    #[serde(default)]
    pub unlock_policy: UnlockPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            cliff_duration: 30 * SECONDS_PER_DAY,
            period_duration: 7 * SECONDS_PER_DAY,
            unlock_percent: 10,
            team_split_percent: 10,
            operator: Address::from_label("operator"),
            owner: Address::from_label("owner"),
            pool_address: Address::from_label("pool"),
            unlock_policy: UnlockPolicy::Recurring,
        }
    }
}

impl PoolConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PoolConfig = toml::from_str(contents)
            .map_err(|e| PoolError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PoolError::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Render configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PoolError::InvalidConfig(format!("Failed to render config: {}", e)))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !(1..=99).contains(&self.unlock_percent) {
            return Err(PoolError::InvalidConfig(format!(
                "unlock_percent must be within 1..=99, got {}",
                self.unlock_percent
            )));
        }

        if !(1..=99).contains(&self.team_split_percent) {
            return Err(PoolError::InvalidConfig(format!(
                "team_split_percent must be within 1..=99, got {}",
                self.team_split_percent
            )));
        }

        if self.operator.is_zero() {
            return Err(PoolError::InvalidConfig("operator cannot be the zero address".to_string()));
        }

        if self.owner.is_zero() {
            return Err(PoolError::InvalidConfig("owner cannot be the zero address".to_string()));
        }

        if self.pool_address.is_zero() {
            return Err(PoolError::InvalidConfig("pool_address cannot be the zero address".to_string()));
        }

        Ok(())
    }
}
