//! # Outbound Ports
//!
//! The vault executes synchronously against these traits, matching the
//! atomic call semantics of the contract it models. Both ports ship with
//! in-memory implementations used by tests and the embedded chain adapter.

use parking_lot::RwLock;
use primitive_types::U256;
use sb_types::ChainAddress;
use std::collections::HashMap;

/// ERC-20-style token ledger - outbound port.
///
/// Both methods return the token's boolean result; any falsey return is a
/// failed movement and the caller must revert.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` of `asset` from `from` to `to` using the caller's
    /// allowance. Returns false on insufficient balance or allowance.
    fn transfer_from(
        &self,
        asset: &ChainAddress,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: U256,
    ) -> bool;

    /// Move `amount` of `asset` from the holder `from` to `to`.
    fn transfer(
        &self,
        asset: &ChainAddress,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: U256,
    ) -> bool;
}

/// Time source - outbound port.
pub trait Clock: Send + Sync {
    /// Current time, seconds since epoch.
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: RwLock<u64>,
}

impl ManualClock {
    /// Create at a given timestamp.
    pub fn at(now: u64) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Set the current time.
    pub fn set(&self, now: u64) {
        *self.now.write() = now;
    }

    /// Advance the current time.
    pub fn advance(&self, secs: u64) {
        *self.now.write() += secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        *self.now.read()
    }
}

/// In-memory token ledger with balances and allowances.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    /// (asset, holder) -> balance.
    balances: RwLock<HashMap<(ChainAddress, ChainAddress), U256>>,
    /// (asset, owner, spender) -> allowance.
    allowances: RwLock<HashMap<(ChainAddress, ChainAddress, ChainAddress), U256>>,
}

impl InMemoryTokenLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a holder's balance.
    pub fn mint(&self, asset: &ChainAddress, holder: &ChainAddress, amount: U256) {
        let mut balances = self.balances.write();
        let entry = balances
            .entry((asset.clone(), holder.clone()))
            .or_insert_with(U256::zero);
        *entry += amount;
    }

    /// Current balance of a holder.
    pub fn balance_of(&self, asset: &ChainAddress, holder: &ChainAddress) -> U256 {
        self.balances
            .read()
            .get(&(asset.clone(), holder.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Grant a spender allowance over an owner's balance.
    pub fn approve(
        &self,
        asset: &ChainAddress,
        owner: &ChainAddress,
        spender: &ChainAddress,
        amount: U256,
    ) {
        self.allowances
            .write()
            .insert((asset.clone(), owner.clone(), spender.clone()), amount);
    }

    fn move_balance(
        &self,
        asset: &ChainAddress,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: U256,
    ) -> bool {
        let mut balances = self.balances.write();
        let from_key = (asset.clone(), from.clone());
        let available = balances.get(&from_key).copied().unwrap_or_default();
        if available < amount {
            return false;
        }
        balances.insert(from_key, available - amount);
        let to_entry = balances
            .entry((asset.clone(), to.clone()))
            .or_insert_with(U256::zero);
        *to_entry += amount;
        true
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer_from(
        &self,
        asset: &ChainAddress,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: U256,
    ) -> bool {
        // Spender is the recipient vault; consume its allowance first.
        let key = (asset.clone(), from.clone(), to.clone());
        {
            let mut allowances = self.allowances.write();
            let granted = allowances.get(&key).copied().unwrap_or_default();
            if granted < amount {
                return false;
            }
            allowances.insert(key, granted - amount);
        }
        if !self.move_balance(asset, from, to, amount) {
            // Restore the consumed allowance; the call reverts wholly.
            let key = (asset.clone(), from.clone(), to.clone());
            let mut allowances = self.allowances.write();
            let granted = allowances.get(&key).copied().unwrap_or_default();
            allowances.insert(key, granted + amount);
            return false;
        }
        true
    }

    fn transfer(
        &self,
        asset: &ChainAddress,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: U256,
    ) -> bool {
        self.move_balance(asset, from, to, amount)
    }
}
