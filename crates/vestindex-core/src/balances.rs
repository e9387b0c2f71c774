//! Balance projection: mirrors the net effect of every observed transfer.

use std::collections::HashMap;

use alloy_primitives::{Address, I256, U256};

use crate::amount::to_signed;

/// Address → balance in base units.
///
/// Balances are signed: the projection trusts the ledger's own checks and
/// never rejects a transfer. A negative balance means events were missed
/// before the cursor's starting point.
#[derive(Debug, Default, Clone)]
pub struct BalanceProjection {
    balances: HashMap<Address, I256>,
}

impl BalanceProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay one transfer. Mints (from the zero address) only credit `to`.
    pub fn apply_transfer(&mut self, from: Address, to: Address, amount: U256) {
        let delta = to_signed(amount);
        if from != Address::ZERO {
            let entry = self.balances.entry(from).or_insert(I256::ZERO);
            *entry = entry.saturating_sub(delta);
        }
        let entry = self.balances.entry(to).or_insert(I256::ZERO);
        *entry = entry.saturating_add(delta);
    }

    /// Current balance of `address`, if it was ever touched.
    pub fn get(&self, address: &Address) -> Option<I256> {
        self.balances.get(address).copied()
    }

    /// The full address → balance mapping.
    pub fn snapshot(&self) -> HashMap<Address, I256> {
        self.balances.clone()
    }

    /// Sum of all tracked balances. Burns to the zero address stay in the sum
    /// because the zero address is credited like any other receiver.
    pub fn total_supply_view(&self) -> I256 {
        self.balances
            .values()
            .fold(I256::ZERO, |acc, v| acc.saturating_add(*v))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn units(n: u64) -> U256 {
        U256::from(n)
    }

    fn signed(n: i64) -> I256 {
        let magnitude = to_signed(U256::from(n.unsigned_abs()));
        if n < 0 {
            I256::ZERO.saturating_sub(magnitude)
        } else {
            magnitude
        }
    }

    #[test]
    fn chained_transfers_without_underflow_check() {
        let (a, b, c) = (addr(0xa), addr(0xb), addr(0xc));
        let mut p = BalanceProjection::new();
        p.apply_transfer(a, b, units(50));
        p.apply_transfer(b, c, units(20));

        assert_eq!(p.get(&a), Some(signed(-50)));
        assert_eq!(p.get(&b), Some(signed(30)));
        assert_eq!(p.get(&c), Some(signed(20)));
    }

    #[test]
    fn mint_does_not_debit_zero_address() {
        let mut p = BalanceProjection::new();
        p.apply_transfer(Address::ZERO, addr(1), units(1_000));
        assert_eq!(p.get(&Address::ZERO), None);
        assert_eq!(p.get(&addr(1)), Some(signed(1_000)));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn conservation_minted_minus_burned() {
        let mut p = BalanceProjection::new();
        let (a, b, c) = (addr(1), addr(2), addr(3));
        p.apply_transfer(Address::ZERO, a, units(1_000));
        p.apply_transfer(Address::ZERO, b, units(500));
        p.apply_transfer(a, b, units(300));
        p.apply_transfer(b, c, units(450));
        p.apply_transfer(c, a, units(100));
        // burn 200 from a
        p.apply_transfer(a, Address::ZERO, units(200));

        let minted = 1_500i64;
        let burned = 200i64;
        let burned_credit = p.get(&Address::ZERO).unwrap_or(I256::ZERO);
        let circulating = p.total_supply_view().saturating_sub(burned_credit);
        assert_eq!(circulating, signed(minted - burned));
        assert_eq!(burned_credit, signed(burned));
    }

    #[test]
    fn snapshot_contains_every_touched_address() {
        let mut p = BalanceProjection::new();
        p.apply_transfer(addr(1), addr(2), units(1));
        let snap = p.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.contains_key(&addr(1)));
        assert!(snap.contains_key(&addr(2)));
    }
}
