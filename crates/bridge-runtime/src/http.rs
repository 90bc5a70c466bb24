//! # Operator HTTP Service
//!
//! The operator-facing surface of the bridge: direct claim and transfer
//! primitives over the gateway, the orchestrated payment path, and a
//! health probe. This surface is trusted and binds to localhost unless
//! external exposure is explicitly configured; see the runtime docs
//! before exposing it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use sb_chain_gateway::ChainGateway;
use sb_orchestrator::{PayOutcome, PayRequest, PaymentOrchestrator};
use sb_types::{ChainAddress, PaymentHash};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Chain gateway for the direct primitives.
    pub gateway: Arc<ChainGateway>,
    /// Orchestrator for the full payment path.
    pub orchestrator: Arc<PaymentOrchestrator>,
    /// Flips true once wiring completes.
    pub ready: Arc<AtomicBool>,
}

/// Build the operator service router.
pub fn operator_router(state: AppState) -> Router {
    Router::new()
        .route("/claim", post(claim))
        .route("/transfer", post(transfer))
        .route("/process-payment", post(process_payment))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ClaimBody {
    payment_hash: String,
    preimage_hex: String,
}

#[derive(Debug, Deserialize)]
struct TransferBody {
    recipient_address: String,
    amount_sats: u64,
}

#[derive(Debug, Deserialize)]
struct ProcessPaymentBody {
    payment_hash: String,
    #[serde(default)]
    bolt11: Option<String>,
    #[serde(default)]
    tx_hash: Option<String>,
}

async fn claim(
    State(state): State<AppState>,
    Json(body): Json<ClaimBody>,
) -> (StatusCode, Json<Value>) {
    let Ok(hash) = PaymentHash::parse(&body.payment_hash) else {
        return bad_request("invalid_payment_hash");
    };
    let Ok(preimage) = hex::decode(body.preimage_hex.trim()) else {
        return bad_request("invalid_preimage_hex");
    };

    match state.gateway.submit_claim(hash, &preimage).await {
        Ok(tx_hash) => {
            info!("[sb-http] claim {} -> {}", hash, tx_hash);
            (
                StatusCode::OK,
                Json(json!({ "status": "claimed", "tx_hash": tx_hash })),
            )
        }
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "claim_failed", "detail": error.to_string() })),
        ),
    }
}

async fn transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> (StatusCode, Json<Value>) {
    let Ok(recipient) = ChainAddress::parse_non_zero(&body.recipient_address) else {
        return bad_request("invalid_recipient_address");
    };
    if body.amount_sats == 0 {
        return bad_request("invalid_amount");
    }

    match state.gateway.submit_transfer(&recipient, body.amount_sats).await {
        Ok((tx_hash, amount_units)) => (
            StatusCode::OK,
            Json(json!({
                "status": "sent",
                "tx_hash": tx_hash,
                "amount_units": amount_units.to_string(),
            })),
        ),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "transfer_failed", "detail": error.to_string() })),
        ),
    }
}

async fn process_payment(
    State(state): State<AppState>,
    Json(body): Json<ProcessPaymentBody>,
) -> (StatusCode, Json<Value>) {
    let request = PayRequest {
        payment_hash: body.payment_hash,
        bolt11: body.bolt11,
        tx_hash_hint: body.tx_hash,
    };
    match state.orchestrator.process_payment_request(request).await {
        Ok(PayOutcome::Claimed { tx_hash }) => (
            StatusCode::OK,
            Json(json!({ "status": "claimed", "tx_hash": tx_hash })),
        ),
        Ok(PayOutcome::AlreadyClaimed) => (
            StatusCode::OK,
            Json(json!({ "status": "already_claimed", "skipped": true })),
        ),
        Err(error) => (
            StatusCode::from_u16(error.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({ "error": error.code(), "detail": error.to_string() })),
        ),
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "ready": state.ready.load(Ordering::Relaxed) }))
}

fn bad_request(code: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": code })))
}
