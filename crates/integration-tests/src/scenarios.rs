//! # End-to-End Scenarios
//!
//! The bridge flows that matter, driven through the full stack with
//! literal amounts and timestamps.

use crate::harness::{addr, build_bridge};
use primitive_types::U256;
use sb_escrow::{EscrowError, Phase};
use sb_orchestrator::{ClnInvoice, CreditStatus, InvoiceRecord, PayOutcome, PaymentStatus};
use sb_types::PaymentHash;

#[tokio::test]
async fn happy_path_claim_moves_lock_to_treasury() {
    let bridge = build_bridge();
    let hash = bridge.lock(b"ln-secret", 5000);

    // Lock effects: user drained, vault holds the escrow.
    assert_eq!(bridge.balance(&bridge.cast.user), U256::zero());
    assert_eq!(bridge.balance(&bridge.cast.vault), U256::from(5000u64));
    let position = bridge.vault.get_escrow(&hash);
    assert_eq!(position.phase, Phase::Locked);
    assert_eq!(position.locked_at, 1000);
    assert_eq!(position.expires_at, 4600);

    bridge.clock.set(1500);
    bridge.register_paid_invoice(hash, b"ln-secret", 5_000_000);

    let outcome = bridge.process(hash).await.unwrap();
    assert!(matches!(outcome, PayOutcome::Claimed { .. }));

    // Claim effects: vault drained, treasury credited, phase terminal.
    assert_eq!(bridge.balance(&bridge.cast.user), U256::zero());
    assert_eq!(bridge.balance(&bridge.cast.vault), U256::zero());
    assert_eq!(bridge.balance(&bridge.cast.treasury), U256::from(5000u64));
    assert_eq!(bridge.vault.get_escrow(&hash).phase, Phase::Claimed);

    let document = bridge.store.read().await.unwrap();
    let record = &document.payments[&hash.to_hex()];
    assert_eq!(record.status, PaymentStatus::Claimed);
    assert_eq!(record.amount_sats.as_deref(), Some("5000"));
}

#[tokio::test]
async fn refund_after_expiry_restores_user() {
    let bridge = build_bridge();
    bridge.clock.set(5000);
    let hash = bridge.lock(b"refund-secret", 5000);

    // Still active at lock time + window - 1.
    bridge.clock.set(8599);
    assert_eq!(bridge.vault.refund(hash), Err(EscrowError::EscrowActive));

    bridge.clock.set(8601);
    bridge.vault.refund(hash).unwrap();

    assert_eq!(bridge.balance(&bridge.cast.user), U256::from(5000u64));
    assert_eq!(bridge.balance(&bridge.cast.vault), U256::zero());
    assert_eq!(bridge.vault.get_escrow(&hash).phase, Phase::Refunded);
}

#[tokio::test]
async fn operator_refund_works_before_expiry() {
    let bridge = build_bridge();
    bridge.clock.set(12_000);
    let hash = bridge.lock(b"coop-secret", 5000);

    bridge.clock.set(12_001);
    bridge
        .vault
        .operator_refund(&bridge.cast.operator, hash)
        .unwrap();

    assert_eq!(bridge.vault.get_escrow(&hash).phase, Phase::Refunded);
    assert_eq!(bridge.balance(&bridge.cast.user), U256::from(5000u64));
}

#[tokio::test]
async fn hash_reuse_rejected_for_any_amount_or_user() {
    let bridge = build_bridge();
    let hash = bridge.lock(b"reused", 5000);

    // Same user, different amount.
    bridge
        .ledger
        .mint(&bridge.cast.asset, &bridge.cast.user, U256::from(100u64));
    bridge.ledger.approve(
        &bridge.cast.asset,
        &bridge.cast.user,
        &bridge.cast.vault,
        U256::from(100u64),
    );
    assert_eq!(
        bridge.vault.lock_for_ln_payment(
            &bridge.cast.user,
            &bridge.cast.user,
            U256::from(100u64),
            hash
        ),
        Err(EscrowError::HashReused)
    );

    // Different user entirely.
    let other = addr("0x606");
    bridge
        .ledger
        .mint(&bridge.cast.asset, &other, U256::from(100u64));
    bridge.ledger.approve(
        &bridge.cast.asset,
        &other,
        &bridge.cast.vault,
        U256::from(100u64),
    );
    assert_eq!(
        bridge
            .vault
            .lock_for_ln_payment(&other, &other, U256::from(100u64), hash),
        Err(EscrowError::HashReused)
    );
}

#[tokio::test]
async fn amount_mismatch_aborts_without_pay_or_claim() {
    let bridge = build_bridge();
    let hash = bridge.lock(b"mismatch", 5000);

    // The node's invoice decodes to 6000 sats against the 5000-sat lock.
    bridge.node.add_invoice(ClnInvoice {
        label: "bad-invoice".to_string(),
        status: "unpaid".to_string(),
        payment_hash: Some(hash.to_hex()),
        amount_msat: Some(serde_json::json!(6_000_000)),
        bolt11: Some("lnbc-wrong-amount".to_string()),
        ..Default::default()
    });

    let error = bridge.process(hash).await.unwrap_err();
    assert_eq!(error.code(), "amount_mismatch");

    // No Lightning pay, no chain transaction, lock untouched.
    assert_eq!(bridge.node.pay_count(), 0);
    assert_eq!(bridge.chain.transaction_count(), 0);
    assert_eq!(bridge.vault.get_escrow(&hash).phase, Phase::Locked);

    let document = bridge.store.read().await.unwrap();
    let record = &document.payments[&hash.to_hex()];
    assert_eq!(record.status, PaymentStatus::LightningFailed);
    assert_eq!(
        record.lightning.failure.as_ref().unwrap()["code"],
        "amount_mismatch"
    );
}

#[tokio::test]
async fn repeat_after_success_is_skipped_with_no_traffic() {
    let bridge = build_bridge();
    let hash = bridge.lock(b"idempotent", 5000);
    bridge.register_paid_invoice(hash, b"idempotent", 5_000_000);

    bridge.process(hash).await.unwrap();
    let transactions_after_first = bridge.chain.transaction_count();

    let outcome = bridge.process(hash).await.unwrap();
    assert_eq!(outcome, PayOutcome::AlreadyClaimed);
    assert_eq!(bridge.chain.transaction_count(), transactions_after_first);
    assert_eq!(bridge.node.pay_count(), 0);

    let document = bridge.store.read().await.unwrap();
    let events: Vec<&str> = document.payments[&hash.to_hex()]
        .history
        .iter()
        .map(|e| e.event.as_str())
        .collect();
    assert_eq!(events.last(), Some(&"already_claimed"));
}

#[tokio::test]
async fn nonce_lane_is_monotonic_and_reseeds_after_desync() {
    let bridge = build_bridge();

    // Two claims through the lane.
    for (index, preimage) in [b"nonce-a".as_slice(), b"nonce-b".as_slice()]
        .into_iter()
        .enumerate()
    {
        let hash = bridge.lock(preimage, 1000 + index as u64);
        bridge.register_paid_invoice(hash, preimage, (1000 + index as u64) * 1000);
        bridge.process(hash).await.unwrap();
    }
    assert_eq!(bridge.chain.accepted_nonces(), vec![0, 1]);

    // A competing transaction consumes nonce 2 out-of-band; the lane's
    // next submission fails with a desync error and re-seeds.
    bridge.chain.desync_nonce();
    let hash = bridge.lock(b"nonce-c", 3000);
    bridge.register_paid_invoice(hash, b"nonce-c", 3_000_000);
    let error = bridge.process(hash).await.unwrap_err();
    assert_eq!(error.code(), "chain_error");

    // The retry lands with the re-seeded nonce.
    bridge.process(hash).await.unwrap();
    let nonces = bridge.chain.accepted_nonces();
    assert_eq!(nonces, vec![0, 1, 3]);
    assert!(nonces.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn claim_failure_leaves_lock_refundable() {
    let bridge = build_bridge();
    let hash = bridge.lock(b"true-secret", 5000);

    // The node hands over a preimage that does not match the lock; the
    // on-chain claim rejects it and the position stays Locked.
    bridge.register_paid_invoice(hash, b"false-secret", 5_000_000);

    let error = bridge.process(hash).await.unwrap_err();
    assert_eq!(error.code(), "claim_failed");
    assert_eq!(bridge.vault.get_escrow(&hash).phase, Phase::Locked);

    // Past expiry the user recovers the funds.
    bridge.clock.set(4600);
    bridge.vault.refund(hash).unwrap();
    assert_eq!(bridge.balance(&bridge.cast.user), U256::from(5000u64));
}

#[tokio::test]
async fn paid_invoice_credits_merchant_through_monitor() {
    use sb_credit_monitor::{CreditMonitor, MonitorConfig};
    use sb_escrow::Clock;
    use sb_orchestrator::LightningRpc;
    use std::sync::Arc;

    let bridge = build_bridge();
    let merchant = addr("0x606");

    // Operator holds float to credit from.
    bridge
        .ledger
        .mint(&bridge.cast.asset, &bridge.cast.operator, U256::from(700u64));

    // A bridge-issued invoice awaiting payment.
    bridge
        .store
        .mutate(|doc| {
            let mut record = InvoiceRecord::new("merchant-1", 900);
            record.credit_address = Some(merchant.as_str().to_string());
            doc.invoices.insert("merchant-1".to_string(), record);
        })
        .await
        .unwrap();

    // The node reports it paid.
    bridge.node.add_invoice(ClnInvoice {
        label: "merchant-1".to_string(),
        status: "paid".to_string(),
        payment_hash: Some("ab".repeat(32)),
        amount_msat: Some(serde_json::json!("700000msat")),
        paid_at: Some(950),
        ..Default::default()
    });

    let monitor = CreditMonitor::new(
        Arc::clone(&bridge.node) as Arc<dyn LightningRpc>,
        Arc::clone(&bridge.gateway),
        Arc::clone(&bridge.store),
        Arc::clone(&bridge.clock) as Arc<dyn Clock>,
        MonitorConfig::default(),
    );
    monitor.tick().await.unwrap();

    assert_eq!(bridge.balance(&merchant), U256::from(700u64));
    let document = bridge.store.read().await.unwrap();
    let record = &document.invoices["merchant-1"];
    assert_eq!(record.credit.status, CreditStatus::Credited);
    assert_eq!(record.credit.amount_units.as_deref(), Some("700"));
    assert_eq!(record.payment_hash.as_deref(), Some("ab".repeat(32).as_str()));
}

#[tokio::test]
async fn expiry_window_and_amount_bounds_hold() {
    let bridge = build_bridge();

    // Expiry bound: expires_at - locked_at == window for any lock time.
    bridge.clock.set(77_777);
    let hash = bridge.lock(b"bounds", 10_000);
    let position = bridge.vault.get_escrow(&hash);
    assert_eq!(position.expires_at - position.locked_at, 3600);

    // Amount bound: the limit is inclusive, one past it fails.
    let over = PaymentHash::sha256_of(b"over-limit");
    bridge
        .ledger
        .mint(&bridge.cast.asset, &bridge.cast.user, U256::from(10_001u64));
    bridge.ledger.approve(
        &bridge.cast.asset,
        &bridge.cast.user,
        &bridge.cast.vault,
        U256::from(10_001u64),
    );
    assert_eq!(
        bridge.vault.lock_for_ln_payment(
            &bridge.cast.user,
            &bridge.cast.user,
            U256::from(10_001u64),
            over
        ),
        Err(EscrowError::LimitExceeded)
    );
}
