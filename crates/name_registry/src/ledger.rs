//! Payment rail collaborator
//!
//! The registry only needs an irreversible, all-or-nothing debit. Moving the
//! funds anywhere is the ledger's business.

use crate::errors::PaymentError;
use crate::types::Identity;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

pub trait Ledger: Send + Sync {
    /// Debit `amount` from `payer`. Irreversible on success, no effect on failure.
    fn debit(&self, payer: &Identity, amount: u64) -> Result<(), PaymentError>;
}

/// Balance table kept in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: RwLock<HashMap<Identity, u64>>,
    total_debited: RwLock<u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add funds to an account, creating it if needed.
    pub fn credit(&self, account: Identity, amount: u64) {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, account: &Identity) -> u64 {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    /// Sum of every successful debit
    pub fn total_debited(&self) -> u64 {
        *self.total_debited.read()
    }
}

impl Ledger for MemoryLedger {
    fn debit(&self, payer: &Identity, amount: u64) -> Result<(), PaymentError> {
        let mut balances = self.balances.write();
        let balance = balances
            .get_mut(payer)
            .ok_or_else(|| PaymentError::UnknownAccount {
                account: payer.to_string(),
            })?;

        if *balance < amount {
            return Err(PaymentError::InsufficientFunds {
                required: amount,
                available: *balance,
            });
        }

        *balance -= amount;
        let mut total = self.total_debited.write();
        *total = total.saturating_add(amount);

        debug!(target: "name_registry", "Debited {} from {}", amount, payer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_is_all_or_nothing() {
        let ledger = MemoryLedger::new();
        let alice = Identity([1u8; 32]);
        ledger.credit(alice, 50);

        let err = ledger.debit(&alice, 80).unwrap_err();
        assert_eq!(
            err,
            PaymentError::InsufficientFunds {
                required: 80,
                available: 50
            }
        );
        assert_eq!(ledger.balance(&alice), 50);

        ledger.debit(&alice, 30).unwrap();
        assert_eq!(ledger.balance(&alice), 20);
        assert_eq!(ledger.total_debited(), 30);
    }

    #[test]
    fn unknown_account_is_rejected() {
        let ledger = MemoryLedger::new();
        let err = ledger.debit(&Identity([9u8; 32]), 1).unwrap_err();
        assert!(matches!(err, PaymentError::UnknownAccount { .. }));
    }
}
