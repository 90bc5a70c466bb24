//! # Bridge Harness
//!
//! Builds the full bridge stack against an in-process chain and a
//! scriptable Lightning node, with a manually driven clock.

use primitive_types::U256;
use sb_chain_gateway::{ChainGateway, ChainRpc, EmbeddedChain, GatewayConfig};
use sb_escrow::{
    Clock, EscrowVault, InMemoryTokenLedger, ManualClock, TokenLedger, VaultConfig,
};
use sb_orchestrator::{
    ClnInvoice, DocumentStore, LightningRpc, MockLightningNode, PayOutcome, PayRequest,
    PaymentOrchestrator, PaymentPolicy,
};
use sb_types::{ChainAddress, PaymentHash};
use std::sync::Arc;

/// Standard cast of the scenarios.
pub struct Cast {
    /// Vault owner.
    pub owner: ChainAddress,
    /// Protocol operator.
    pub operator: ChainAddress,
    /// Protocol treasury.
    pub treasury: ChainAddress,
    /// Escrowed asset.
    pub asset: ChainAddress,
    /// The locking user.
    pub user: ChainAddress,
    /// The vault's own address.
    pub vault: ChainAddress,
}

impl Default for Cast {
    fn default() -> Self {
        Self {
            owner: addr("0x101"),
            operator: addr("0x202"),
            treasury: addr("0x303"),
            asset: addr("0x404"),
            user: addr("0x505"),
            vault: addr("0x900"),
        }
    }
}

/// The assembled bridge.
pub struct Bridge {
    /// The cast of addresses.
    pub cast: Cast,
    /// Token ledger backing the chain.
    pub ledger: Arc<InMemoryTokenLedger>,
    /// The escrow vault.
    pub vault: Arc<EscrowVault>,
    /// The in-process chain.
    pub chain: Arc<EmbeddedChain>,
    /// The gateway over it.
    pub gateway: Arc<ChainGateway>,
    /// The scriptable Lightning node.
    pub node: Arc<MockLightningNode>,
    /// The persistent store.
    pub store: Arc<DocumentStore>,
    /// The orchestrator under test.
    pub orchestrator: PaymentOrchestrator,
    /// The manually driven clock.
    pub clock: Arc<ManualClock>,
    _dir: tempfile::TempDir,
}

/// Build the full stack with the standard cast, a 3600 s expiry window,
/// and a 10 000-unit payment limit.
pub fn build_bridge() -> Bridge {
    let cast = Cast::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = Arc::new(InMemoryTokenLedger::new());
    let clock = Arc::new(ManualClock::at(1000));

    let vault = Arc::new(
        EscrowVault::new(
            cast.vault.clone(),
            VaultConfig {
                owner: cast.owner.clone(),
                protocol_operator: cast.operator.clone(),
                protocol_treasury: cast.treasury.clone(),
                asset: cast.asset.clone(),
                expiry_window: 3600,
                payment_limit: U256::from(10_000u64),
            },
            Arc::clone(&ledger) as Arc<dyn TokenLedger>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .expect("valid vault config"),
    );

    let chain = Arc::new(EmbeddedChain::new(
        Arc::clone(&vault),
        Arc::clone(&ledger),
        cast.operator.clone(),
    ));
    let gateway = Arc::new(
        ChainGateway::new(
            Arc::clone(&chain) as Arc<dyn ChainRpc>,
            GatewayConfig {
                escrow_address: cast.vault.clone(),
                token_address: cast.asset.clone(),
                token_decimals: 8,
            },
        )
        .expect("valid gateway config"),
    );

    let node = Arc::new(MockLightningNode::new());
    let store = Arc::new(
        DocumentStore::open(&dir.path().join("bridge.json")).expect("store opens"),
    );
    let orchestrator = PaymentOrchestrator::new(
        Arc::clone(&gateway),
        Arc::clone(&node) as Arc<dyn LightningRpc>,
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
        PaymentPolicy::default(),
    );

    Bridge {
        cast,
        ledger,
        vault,
        chain,
        gateway,
        node,
        store,
        orchestrator,
        clock,
        _dir: dir,
    }
}

impl Bridge {
    /// Fund the user and lock `amount` against the hash of `preimage`.
    pub fn lock(&self, preimage: &[u8], amount: u64) -> PaymentHash {
        let hash = PaymentHash::sha256_of(preimage);
        self.ledger
            .mint(&self.cast.asset, &self.cast.user, U256::from(amount));
        self.ledger.approve(
            &self.cast.asset,
            &self.cast.user,
            &self.cast.vault,
            U256::from(amount),
        );
        self.vault
            .lock_for_ln_payment(&self.cast.user, &self.cast.user, U256::from(amount), hash)
            .expect("lock succeeds");
        hash
    }

    /// Register a paid invoice for `hash` on the mock node, revealing the
    /// preimage.
    pub fn register_paid_invoice(&self, hash: PaymentHash, preimage: &[u8], msat: u64) {
        self.node.add_invoice(ClnInvoice {
            label: format!("lock-{hash}"),
            status: "paid".to_string(),
            payment_hash: Some(hash.to_hex()),
            payment_preimage: Some(hex::encode(preimage)),
            amount_msat: Some(serde_json::json!(msat)),
            bolt11: Some(format!("lnbc-{hash}")),
            ..Default::default()
        });
    }

    /// Run a payment request for `hash` with no extra inputs.
    pub async fn process(&self, hash: PaymentHash) -> Result<PayOutcome, sb_orchestrator::OrchestratorError> {
        self.orchestrator
            .process_payment_request(PayRequest {
                payment_hash: hash.to_prefixed_hex(),
                ..Default::default()
            })
            .await
    }

    /// Token balance of an address.
    pub fn balance(&self, holder: &ChainAddress) -> U256 {
        self.ledger.balance_of(&self.cast.asset, holder)
    }
}

/// Parse an address literal.
pub fn addr(s: &str) -> ChainAddress {
    ChainAddress::parse(s).expect("valid address literal")
}
