//! # satbridge Runtime
//!
//! The operator daemon. Wires the persistent store, the chain gateway,
//! the Lightning client, the payment orchestrator, and the credit
//! monitor, then serves the operator HTTP surface until shutdown.
//!
//! ## Architecture
//!
//! ```text
//!                        ┌──────────────────┐
//!   user lock on chain   │  EscrowContract  │   claim / refund
//!  ─────────────────────►│  (on chain)      │◄───────────────────┐
//!                        └──────────────────┘                    │
//!                                 ▲ read                         │
//!                                 │                   ┌──────────┴─────────┐
//!   POST /process-payment  ┌──────┴─────────┐  claim  │    ChainGateway    │
//!  ───────────────────────►│ Orchestrator   ├────────►│  (one nonce lane)  │
//!                          └──────┬─────────┘         └──────────▲─────────┘
//!                                 │ pay / listinvoices           │ transfer
//!                          ┌──────▼─────────┐         ┌──────────┴─────────┐
//!                          │ Lightning node │◄────────┤   CreditMonitor    │
//!                          └────────────────┘  polls  └────────────────────┘
//! ```

use anyhow::{Context, Result};
use bridge_runtime::config::BridgeConfig;
use bridge_runtime::http::{operator_router, AppState};
use sb_chain_gateway::{ChainGateway, ChainRpc, GatewayConfig, JsonRpcChainClient};
use sb_credit_monitor::{CreditMonitor, MonitorConfig};
use sb_escrow::{Clock, SystemClock};
use sb_orchestrator::{
    ClnRestClient, DocumentStore, LightningRpc, PaymentOrchestrator, PaymentPolicy,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let config = BridgeConfig::from_env().context("configuration error")?;
    info!("Starting satbridge runtime...");
    info!("Escrow: {}", config.escrow_address);
    info!("Token: {} ({} decimals)", config.token_address, config.token_decimals);
    info!("Store: {}", config.data_file_path.display());

    let store = Arc::new(DocumentStore::open(&config.data_file_path)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let chain_rpc: Arc<dyn ChainRpc> = Arc::new(JsonRpcChainClient::new(
        &config.chain_rpc_url,
        &config.operator_private_key,
    ));
    let gateway = Arc::new(ChainGateway::new(
        chain_rpc,
        GatewayConfig {
            escrow_address: config.escrow_address.clone(),
            token_address: config.token_address.clone(),
            token_decimals: config.token_decimals,
        },
    )?);

    let lightning: Arc<dyn LightningRpc> = Arc::new(ClnRestClient::new(
        &config.lightning_rest_url,
        &config.lightning_auth_token_path,
    ));

    let orchestrator = Arc::new(PaymentOrchestrator::new(
        Arc::clone(&gateway),
        Arc::clone(&lightning),
        Arc::clone(&store),
        Arc::clone(&clock),
        PaymentPolicy {
            pay_retry_for_seconds: config.pay_retry_for_seconds,
            max_fee_percent: config.max_fee_percent,
        },
    ));

    let monitor = CreditMonitor::new(
        Arc::clone(&lightning),
        Arc::clone(&gateway),
        Arc::clone(&store),
        Arc::clone(&clock),
        MonitorConfig {
            interval_ms: config.invoice_monitor_interval_ms,
            retry_ms: config.invoice_monitor_retry_ms,
            stale_ms: config.invoice_monitor_stale_ms,
        },
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let monitor_handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    let ready = Arc::new(AtomicBool::new(false));
    let router = operator_router(AppState {
        gateway,
        orchestrator,
        ready: Arc::clone(&ready),
    });

    let bind_addr = config.operator_bind_addr();
    if config.allow_external {
        tracing::warn!(
            "operator service exposed beyond localhost on {}; it carries no request auth",
            bind_addr
        );
    }
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind operator service on {bind_addr}"))?;
    info!("Operator service listening on {}", bind_addr);
    ready.store(true, Ordering::Relaxed);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await
        .context("operator service error")?;

    let _ = shutdown_tx.send(true);
    let _ = monitor_handle.await;
    info!("satbridge runtime stopped");
    Ok(())
}
