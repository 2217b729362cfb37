//! Withdrawal path for the operator reserve.

use sharepool_types::{Address, Amount};

use crate::error::{PoolError, Result};
use crate::locked_pool::LockedPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorLedger {
    operator: Address,
}

impl OperatorLedger {
    pub fn new(operator: Address) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Debit the reserve for a withdrawal by `caller`.
    ///
    /// Only the reserve is touched; the caller performs the transfer after.
    /// Returns the debited amount.
    pub fn debit(&self, caller: Address, balances: &mut LockedPool, amount: Amount, use_all: bool) -> Result<Amount> {
        if caller != self.operator {
            return Err(PoolError::Unauthorized(format!("{} is not the operator", caller)));
        }

        let to_withdraw = if use_all { balances.operator_reserve() } else { amount };
        balances.debit_operator_reserve(to_withdraw)?;
        Ok(to_withdraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_debit() {
        let operator = Address::from_bytes([9u8; 20]);
        let ledger = OperatorLedger::new(operator);
        let mut balances = LockedPool::new();
        balances.deposit(1000, 10).unwrap();

        assert!(matches!(
            ledger.debit(Address::from_bytes([1u8; 20]), &mut balances, 10, false),
            Err(PoolError::Unauthorized(_))
        ));

        assert_eq!(ledger.debit(operator, &mut balances, 40, false).unwrap(), 40);
        assert_eq!(ledger.debit(operator, &mut balances, 0, true).unwrap(), 60);
        assert_eq!(balances.operator_reserve(), 0);
        assert_eq!(balances.locked_balance(), 900);
    }
}
