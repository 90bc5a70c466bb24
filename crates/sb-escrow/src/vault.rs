//! # Escrow Vault
//!
//! The vault state machine. Executes with atomic call semantics: every
//! operation validates all preconditions before touching the ledger or the
//! position map, so a returned error means no state changed.

use crate::domain::{EscrowError, EscrowEvent, EscrowPosition, Phase, VaultConfig};
use crate::ports::{Clock, TokenLedger};
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use sb_types::{ChainAddress, PaymentHash};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Hashed time-locked token escrow.
///
/// Positions are keyed by payment hash; a hash may be written to `Locked`
/// at most once over the vault's lifetime. Claims require the operator and
/// the SHA-256 preimage; refunds require expiry, except for the operator's
/// cooperative [`EscrowVault::operator_refund`], which deliberately works
/// before expiry and therefore rests entirely on operator trust.
pub struct EscrowVault {
    /// The vault's own on-chain address (the token holder while Locked).
    address: ChainAddress,
    config: RwLock<VaultConfig>,
    positions: RwLock<HashMap<PaymentHash, EscrowPosition>>,
    events: Mutex<Vec<EscrowEvent>>,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
}

impl EscrowVault {
    /// Create a vault, validating the configuration against the named
    /// error set.
    pub fn new(
        address: ChainAddress,
        config: VaultConfig,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EscrowError> {
        config.validate()?;
        Ok(Self {
            address,
            config: RwLock::new(config),
            positions: RwLock::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            ledger,
            clock,
        })
    }

    /// The vault's own address.
    pub fn address(&self) -> ChainAddress {
        self.address.clone()
    }

    /// Lock `amount` token units from `user` against `hash`.
    pub fn lock_for_ln_payment(
        &self,
        caller: &ChainAddress,
        user: &ChainAddress,
        amount: U256,
        hash: PaymentHash,
    ) -> Result<(), EscrowError> {
        if user.is_zero() {
            return Err(EscrowError::UserZero);
        }
        if caller != user {
            return Err(EscrowError::NotUser);
        }
        if amount.is_zero() {
            return Err(EscrowError::AmountZero);
        }

        let config = self.config.read().clone();
        if amount > config.payment_limit {
            return Err(EscrowError::LimitExceeded);
        }

        let mut positions = self.positions.write();
        let existing = positions.get(&hash).map(|p| p.phase).unwrap_or_default();
        if existing != Phase::None {
            return Err(EscrowError::HashReused);
        }

        if !self
            .ledger
            .transfer_from(&config.asset, user, &self.address, amount)
        {
            return Err(EscrowError::TransferFromFail);
        }

        let now = self.clock.now();
        let expires_at = now + config.expiry_window;
        positions.insert(
            hash,
            EscrowPosition {
                phase: Phase::Locked,
                user: user.clone(),
                amount,
                expires_at,
                locked_at: now,
            },
        );

        info!("[sb-escrow] locked {} units under {}", amount, hash);
        self.emit(EscrowEvent::Locked {
            user: user.clone(),
            amount,
            hash,
            expires_at,
            locked_at: now,
        });
        Ok(())
    }

    /// Claim a locked position to the treasury with the revealed preimage.
    pub fn claim(
        &self,
        caller: &ChainAddress,
        hash: PaymentHash,
        preimage: &[u8],
    ) -> Result<(), EscrowError> {
        let config = self.config.read().clone();
        if caller != &config.protocol_operator {
            return Err(EscrowError::NotOperator);
        }

        let mut positions = self.positions.write();
        let position = positions
            .get_mut(&hash)
            .filter(|p| p.phase == Phase::Locked)
            .ok_or(EscrowError::NotLocked)?;

        if PaymentHash::sha256_of(preimage) != hash {
            return Err(EscrowError::HashMismatch);
        }

        if !self.ledger.transfer(
            &config.asset,
            &self.address,
            &config.protocol_treasury,
            position.amount,
        ) {
            return Err(EscrowError::TransferFail);
        }

        position.phase = Phase::Claimed;
        let (user, amount) = (position.user.clone(), position.amount);
        drop(positions);

        info!("[sb-escrow] claimed {} units under {}", amount, hash);
        self.emit(EscrowEvent::Claimed {
            user,
            hash,
            amount,
            preimage: preimage.to_vec(),
            claimer: caller.clone(),
        });
        Ok(())
    }

    /// Refund an expired lock to the user. Open to any caller once
    /// `now >= expires_at`.
    pub fn refund(&self, hash: PaymentHash) -> Result<(), EscrowError> {
        let now = self.clock.now();
        self.refund_inner(hash, now, true)
    }

    /// Operator's cooperative abort: same effects as [`Self::refund`] but
    /// permitted before expiry. The expiry bypass is the intended safety
    /// valve and widens operator trust accordingly.
    pub fn operator_refund(
        &self,
        caller: &ChainAddress,
        hash: PaymentHash,
    ) -> Result<(), EscrowError> {
        if caller != &self.config.read().protocol_operator {
            return Err(EscrowError::NotOperator);
        }
        let now = self.clock.now();
        warn!("[sb-escrow] operator refund before expiry for {}", hash);
        self.refund_inner(hash, now, false)
    }

    fn refund_inner(
        &self,
        hash: PaymentHash,
        now: u64,
        enforce_expiry: bool,
    ) -> Result<(), EscrowError> {
        let config = self.config.read().clone();
        let mut positions = self.positions.write();
        let position = positions
            .get_mut(&hash)
            .filter(|p| p.phase == Phase::Locked)
            .ok_or(EscrowError::NotLocked)?;

        if enforce_expiry && !position.is_expired(now) {
            return Err(EscrowError::EscrowActive);
        }

        if !self
            .ledger
            .transfer(&config.asset, &self.address, &position.user, position.amount)
        {
            return Err(EscrowError::TransferFail);
        }

        position.phase = Phase::Refunded;
        let (user, amount) = (position.user.clone(), position.amount);
        drop(positions);

        info!("[sb-escrow] refunded {} units under {}", amount, hash);
        self.emit(EscrowEvent::Refunded {
            hash,
            user,
            amount,
            refunded_at: now,
        });
        Ok(())
    }

    /// Read a position; unknown hashes return the empty `None`-phase view.
    pub fn get_escrow(&self, hash: &PaymentHash) -> EscrowPosition {
        self.positions
            .read()
            .get(hash)
            .cloned()
            .unwrap_or_else(EscrowPosition::none)
    }

    /// Read the current configuration.
    pub fn get_config(&self) -> VaultConfig {
        self.config.read().clone()
    }

    /// Move ownership to a new non-zero address. Owner only.
    pub fn transfer_ownership(
        &self,
        caller: &ChainAddress,
        new_owner: ChainAddress,
    ) -> Result<(), EscrowError> {
        if new_owner.is_zero() {
            return Err(EscrowError::OwnerZero);
        }
        let mut config = self.config.write();
        if caller != &config.owner {
            return Err(EscrowError::NotOwner);
        }
        let previous = std::mem::replace(&mut config.owner, new_owner.clone());
        drop(config);
        self.emit(EscrowEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }

    /// Rotate the protocol operator. Owner only.
    pub fn update_protocol_operator(
        &self,
        caller: &ChainAddress,
        operator: ChainAddress,
    ) -> Result<(), EscrowError> {
        if operator.is_zero() {
            return Err(EscrowError::OperatorZero);
        }
        self.update_config_field(caller, "protocol_operator", |c| {
            c.protocol_operator = operator.clone()
        })
    }

    /// Rotate the protocol treasury. Owner only.
    pub fn update_protocol_treasury(
        &self,
        caller: &ChainAddress,
        treasury: ChainAddress,
    ) -> Result<(), EscrowError> {
        if treasury.is_zero() {
            return Err(EscrowError::TreasuryZero);
        }
        self.update_config_field(caller, "protocol_treasury", |c| {
            c.protocol_treasury = treasury.clone()
        })
    }

    /// Rotate the escrowed asset. Owner only.
    pub fn update_asset(
        &self,
        caller: &ChainAddress,
        asset: ChainAddress,
    ) -> Result<(), EscrowError> {
        if asset.is_zero() {
            return Err(EscrowError::AssetZero);
        }
        self.update_config_field(caller, "asset", |c| c.asset = asset.clone())
    }

    /// Change the expiry window; must stay below one week. Owner only.
    pub fn update_expiry_window(
        &self,
        caller: &ChainAddress,
        window: u64,
    ) -> Result<(), EscrowError> {
        if window >= crate::domain::MAX_EXPIRY_WINDOW_SECS {
            return Err(EscrowError::ExpiryGtWeek(window));
        }
        self.update_config_field(caller, "expiry_window", |c| c.expiry_window = window)
    }

    fn update_config_field(
        &self,
        caller: &ChainAddress,
        field: &'static str,
        apply: impl FnOnce(&mut VaultConfig),
    ) -> Result<(), EscrowError> {
        let mut config = self.config.write();
        if caller != &config.owner {
            return Err(EscrowError::NotOwner);
        }
        apply(&mut config);
        drop(config);
        self.emit(EscrowEvent::ConfigUpdated { field });
        Ok(())
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<EscrowEvent> {
        self.events.lock().clone()
    }

    fn emit(&self, event: EscrowEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryTokenLedger, ManualClock};

    fn addr(s: &str) -> ChainAddress {
        ChainAddress::parse(s).unwrap()
    }

    struct Fixture {
        vault: EscrowVault,
        ledger: Arc<InMemoryTokenLedger>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let ledger = Arc::new(InMemoryTokenLedger::new());
            let clock = Arc::new(ManualClock::at(1000));
            let vault = EscrowVault::new(
                addr("0x900"),
                VaultConfig {
                    owner: addr("0x101"),
                    protocol_operator: addr("0x202"),
                    protocol_treasury: addr("0x303"),
                    asset: addr("0x404"),
                    expiry_window: 3600,
                    payment_limit: U256::from(10_000u64),
                },
                Arc::clone(&ledger) as Arc<dyn TokenLedger>,
                Arc::clone(&clock) as Arc<dyn Clock>,
            )
            .unwrap();
            Self {
                vault,
                ledger,
                clock,
            }
        }

        fn fund_and_approve(&self, user: &ChainAddress, amount: u64) {
            let asset = addr("0x404");
            self.ledger.mint(&asset, user, U256::from(amount));
            self.ledger
                .approve(&asset, user, &addr("0x900"), U256::from(amount));
        }

        fn balance(&self, holder: &str) -> U256 {
            self.ledger.balance_of(&addr("0x404"), &addr(holder))
        }
    }

    #[test]
    fn test_happy_path_claim() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"ln-secret");
        fx.fund_and_approve(&user, 5000);

        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();
        assert_eq!(fx.balance("0x505"), U256::zero());
        assert_eq!(fx.balance("0x900"), U256::from(5000u64));

        let position = fx.vault.get_escrow(&hash);
        assert_eq!(position.phase, Phase::Locked);
        assert_eq!(position.expires_at, 4600);
        assert_eq!(position.locked_at, 1000);

        fx.clock.set(1500);
        fx.vault.claim(&addr("0x202"), hash, b"ln-secret").unwrap();

        assert_eq!(fx.balance("0x900"), U256::zero());
        assert_eq!(fx.balance("0x303"), U256::from(5000u64));
        assert_eq!(fx.vault.get_escrow(&hash).phase, Phase::Claimed);
    }

    #[test]
    fn test_refund_after_expiry() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"refund-secret");
        fx.clock.set(5000);
        fx.fund_and_approve(&user, 5000);
        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();

        fx.clock.set(8599);
        assert_eq!(fx.vault.refund(hash), Err(EscrowError::EscrowActive));

        fx.clock.set(8601);
        fx.vault.refund(hash).unwrap();
        assert_eq!(fx.balance("0x505"), U256::from(5000u64));
        assert_eq!(fx.balance("0x900"), U256::zero());
        assert_eq!(fx.vault.get_escrow(&hash).phase, Phase::Refunded);
    }

    #[test]
    fn test_refund_at_exact_expiry_boundary() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"boundary");
        fx.fund_and_approve(&user, 100);
        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(100u64), hash)
            .unwrap();

        // expires_at = 1000 + 3600; refund allowed when now >= expires_at.
        fx.clock.set(4600);
        assert!(fx.vault.refund(hash).is_ok());
    }

    #[test]
    fn test_operator_refund_before_expiry() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"coop");
        fx.clock.set(12000);
        fx.fund_and_approve(&user, 5000);
        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();

        fx.clock.set(12001);
        assert_eq!(
            fx.vault.operator_refund(&user, hash),
            Err(EscrowError::NotOperator)
        );
        fx.vault.operator_refund(&addr("0x202"), hash).unwrap();
        assert_eq!(fx.vault.get_escrow(&hash).phase, Phase::Refunded);
        assert_eq!(fx.balance("0x505"), U256::from(5000u64));
    }

    #[test]
    fn test_hash_reuse_rejected() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let other = addr("0x606");
        let hash = PaymentHash::sha256_of(b"reuse");
        fx.fund_and_approve(&user, 5000);
        fx.fund_and_approve(&other, 100);

        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();
        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&other, &other, U256::from(100u64), hash),
            Err(EscrowError::HashReused)
        );

        // Terminal phases stay ineligible too.
        fx.vault.claim(&addr("0x202"), hash, b"reuse").unwrap();
        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&other, &other, U256::from(100u64), hash),
            Err(EscrowError::HashReused)
        );
    }

    #[test]
    fn test_lock_validation() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"validation");
        fx.fund_and_approve(&user, 20_000);

        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&ChainAddress::zero(), &ChainAddress::zero(), U256::one(), hash),
            Err(EscrowError::UserZero)
        );
        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&addr("0x606"), &user, U256::one(), hash),
            Err(EscrowError::NotUser)
        );
        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&user, &user, U256::zero(), hash),
            Err(EscrowError::AmountZero)
        );
        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&user, &user, U256::from(10_001u64), hash),
            Err(EscrowError::LimitExceeded)
        );
    }

    #[test]
    fn test_lock_without_approval_fails_and_reverts() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"no-approve");
        fx.ledger
            .mint(&addr("0x404"), &user, U256::from(5000u64));

        assert_eq!(
            fx.vault
                .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash),
            Err(EscrowError::TransferFromFail)
        );
        assert_eq!(fx.vault.get_escrow(&hash).phase, Phase::None);
    }

    #[test]
    fn test_claim_authorization_and_preimage() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"secret");
        fx.fund_and_approve(&user, 5000);
        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();

        assert_eq!(
            fx.vault.claim(&user, hash, b"secret"),
            Err(EscrowError::NotOperator)
        );
        assert_eq!(
            fx.vault.claim(&addr("0x202"), hash, b"wrong"),
            Err(EscrowError::HashMismatch)
        );
        // Failed claims leave the position Locked.
        assert_eq!(fx.vault.get_escrow(&hash).phase, Phase::Locked);

        fx.vault.claim(&addr("0x202"), hash, b"secret").unwrap();
        assert_eq!(
            fx.vault.claim(&addr("0x202"), hash, b"secret"),
            Err(EscrowError::NotLocked)
        );
    }

    #[test]
    fn test_refund_unknown_hash() {
        let fx = Fixture::new();
        assert_eq!(
            fx.vault.refund(PaymentHash::sha256_of(b"missing")),
            Err(EscrowError::NotLocked)
        );
    }

    #[test]
    fn test_admin_updates_owner_gated() {
        let fx = Fixture::new();
        let owner = addr("0x101");
        let stranger = addr("0x666");

        assert_eq!(
            fx.vault.update_expiry_window(&stranger, 60),
            Err(EscrowError::NotOwner)
        );
        fx.vault.update_expiry_window(&owner, 60).unwrap();
        assert_eq!(fx.vault.get_config().expiry_window, 60);

        assert_eq!(
            fx.vault.update_expiry_window(&owner, 604_800),
            Err(EscrowError::ExpiryGtWeek(604_800))
        );

        assert_eq!(
            fx.vault
                .update_protocol_operator(&owner, ChainAddress::zero()),
            Err(EscrowError::OperatorZero)
        );
        fx.vault
            .update_protocol_operator(&owner, addr("0x777"))
            .unwrap();
        assert_eq!(fx.vault.get_config().protocol_operator, addr("0x777"));

        fx.vault.transfer_ownership(&owner, addr("0x808")).unwrap();
        assert_eq!(
            fx.vault.update_asset(&owner, addr("0x405")),
            Err(EscrowError::NotOwner)
        );
        fx.vault
            .update_asset(&addr("0x808"), addr("0x405"))
            .unwrap();
        assert_eq!(fx.vault.get_config().asset, addr("0x405"));
    }

    #[test]
    fn test_events_record_transitions() {
        let fx = Fixture::new();
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(b"events");
        fx.fund_and_approve(&user, 100);
        fx.vault
            .lock_for_ln_payment(&user, &user, U256::from(100u64), hash)
            .unwrap();
        fx.vault.claim(&addr("0x202"), hash, b"events").unwrap();

        let events = fx.vault.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EscrowEvent::Locked { .. }));
        match &events[1] {
            EscrowEvent::Claimed {
                preimage, claimer, ..
            } => {
                assert_eq!(preimage, b"events");
                assert_eq!(claimer, &addr("0x202"));
            }
            other => panic!("expected Claimed, got {other:?}"),
        }
    }
}
