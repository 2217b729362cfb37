//! Per-member withdrawal ledger.
//!
//! A member's entitlement is `floor(unlocked * power / total_power)`; the
//! ledger keeps the cumulative amount each member has taken out so that the
//! entitlement can never be exceeded.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, Amount};
use std::collections::HashMap;

use crate::error::{PoolError, Result};
use crate::registry::PowerRegistry;

/// `floor(unlocked * power / total_power)`.
pub fn entitlement(unlocked: Amount, power: u64, total_power: u64) -> Result<Amount> {
    if total_power == 0 {
        return Err(PoolError::NoMembers);
    }
    unlocked
        .checked_mul(Amount::from(power))
        .map(|scaled| scaled / Amount::from(total_power))
        .ok_or(PoolError::ArithmeticOverflow)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalLedger {
    withdrawn: HashMap<Address, Amount>,
}

impl WithdrawalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative amount `member` has withdrawn.
    pub fn withdrawn(&self, member: &Address) -> Amount {
        self.withdrawn.get(member).copied().unwrap_or(0)
    }

    /// Amount `member` may still withdraw against `unlocked`.
    ///
    /// # Errors
    /// - `NotAMember` if `member` holds no power
    /// - `NoMembers` if no power has been granted at all
    /// - `AccountingMismatch` if the member already withdrew more than the
    ///   entitlement
    pub fn available(&self, registry: &PowerRegistry, unlocked: Amount, member: &Address) -> Result<Amount> {
        let power = registry.power_of(member);
        if power == 0 {
            return Err(PoolError::NotAMember(*member));
        }

        let entitled = entitlement(unlocked, power, registry.total_power())?;
        let withdrawn = self.withdrawn(member);
        entitled.checked_sub(withdrawn).ok_or_else(|| {
            PoolError::AccountingMismatch(format!(
                "{} withdrew {} but is entitled to {}",
                member, withdrawn, entitled
            ))
        })
    }

    /// Record a withdrawal of `amount` (or of everything available when
    /// `use_all` is set) for `member`.
    ///
    /// Only the ledger is touched; the caller performs the transfer afterwards.
    /// Returns the recorded amount.
    pub fn debit(
        &mut self,
        registry: &PowerRegistry,
        unlocked: Amount,
        member: &Address,
        amount: Amount,
        use_all: bool,
    ) -> Result<Amount> {
        let available = self.available(registry, unlocked, member)?;
        let to_withdraw = if use_all { available } else { amount };

        if to_withdraw > available {
            return Err(PoolError::InsufficientFunds {
                requested: to_withdraw,
                available,
            });
        }

        let withdrawn = self
            .withdrawn(member)
            .checked_add(to_withdraw)
            .ok_or(PoolError::ArithmeticOverflow)?;
        self.withdrawn.insert(*member, withdrawn);

        Ok(to_withdraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::EligibilityState;
    use crate::memory::MemoryIdentityOracle;
    use sharepool_types::AssetId;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    /// Registry where member `n` holds asset `n` for each entry.
    fn registry_with(members: &[u8]) -> PowerRegistry {
        let mut oracle = MemoryIdentityOracle::new();
        let mut registry = PowerRegistry::new();
        for &n in members {
            oracle.issue(AssetId(n as u64), addr(n), EligibilityState::Qualified);
            registry.register(&oracle, AssetId(n as u64), addr(n)).unwrap();
        }
        registry
    }

    #[test]
    fn test_entitlement_rounds_down() {
        assert_eq!(entitlement(100, 1, 3).unwrap(), 33);
        assert_eq!(entitlement(100, 2, 3).unwrap(), 66);
        assert_eq!(entitlement(100, 1, 0), Err(PoolError::NoMembers));
    }

    #[test]
    fn test_available_for_non_member() {
        let registry = registry_with(&[1]);
        let ledger = WithdrawalLedger::new();
        assert_eq!(ledger.available(&registry, 450, &addr(9)), Err(PoolError::NotAMember(addr(9))));
    }

    #[test]
    fn test_debit_and_available() {
        let registry = registry_with(&[1]);
        let mut ledger = WithdrawalLedger::new();

        assert_eq!(ledger.available(&registry, 450, &addr(1)).unwrap(), 450);
        assert_eq!(ledger.debit(&registry, 450, &addr(1), 200, false).unwrap(), 200);
        assert_eq!(ledger.withdrawn(&addr(1)), 200);
        assert_eq!(ledger.available(&registry, 450, &addr(1)).unwrap(), 250);

        let over = ledger.debit(&registry, 450, &addr(1), 300, false);
        assert_eq!(over, Err(PoolError::InsufficientFunds { requested: 300, available: 250 }));
        assert_eq!(ledger.withdrawn(&addr(1)), 200);
    }

    #[test]
    fn test_debit_use_all() {
        let registry = registry_with(&[1, 2]);
        let mut ledger = WithdrawalLedger::new();

        assert_eq!(ledger.debit(&registry, 101, &addr(1), 0, true).unwrap(), 50);
        assert_eq!(ledger.available(&registry, 101, &addr(1)).unwrap(), 0);
        assert_eq!(ledger.available(&registry, 101, &addr(2)).unwrap(), 50);

        // More funds unlocked later become available again
        assert_eq!(ledger.available(&registry, 201, &addr(1)).unwrap(), 50);
    }

    #[test]
    fn test_overdrawn_ledger_reports_mismatch() {
        let registry = registry_with(&[1]);
        let mut ledger = WithdrawalLedger::new();
        ledger.debit(&registry, 100, &addr(1), 100, false).unwrap();

        // Entitlement computed against a smaller unlocked balance than was withdrawn
        assert!(matches!(
            ledger.available(&registry, 50, &addr(1)),
            Err(PoolError::AccountingMismatch(_))
        ));
    }
}
