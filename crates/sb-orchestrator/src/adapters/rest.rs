//! # CLN REST Client
//!
//! Speaks the node's REST surface: one POST per RPC method with the rune
//! token from the configured auth file in the `Rune` header.

use crate::cln::{ClnError, ClnInvoice, ClnPay, CreatedInvoice, PayResult};
use crate::ports::LightningRpc;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// REST client for a Core Lightning node.
pub struct ClnRestClient {
    client: reqwest::Client,
    base_url: String,
    auth_token_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct InvoicesResponse {
    #[serde(default)]
    invoices: Vec<ClnInvoice>,
}

#[derive(Debug, Deserialize)]
struct PaysResponse {
    #[serde(default)]
    pays: Vec<ClnPay>,
}

impl ClnRestClient {
    /// Create a client for the node at `base_url`, reading the rune from
    /// `auth_token_path` on each request so rotations apply live.
    pub fn new(base_url: &str, auth_token_path: &Path) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token_path: auth_token_path.to_path_buf(),
        }
    }

    fn rune(&self) -> Result<String, ClnError> {
        let raw = std::fs::read_to_string(&self.auth_token_path)
            .map_err(|e| ClnError::Auth(format!("{}: {e}", self.auth_token_path.display())))?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(ClnError::Auth("empty auth token file".into()));
        }
        Ok(token.to_string())
    }

    async fn post(&self, method: &str, body: Value) -> Result<Value, ClnError> {
        let url = format!("{}/v1/{method}", self.base_url);
        debug!("[sb-ln] {}", method);

        let response = self
            .client
            .post(&url)
            .header("Rune", self.rune()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClnError::Rpc(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ClnError::Auth(format!("node rejected rune: {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClnError::Rpc(format!("{method} failed ({status}): {detail}")));
        }

        response.json().await.map_err(|e| ClnError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl LightningRpc for ClnRestClient {
    async fn list_invoices_by_payment_hash(
        &self,
        payment_hash: &str,
    ) -> Result<Vec<ClnInvoice>, ClnError> {
        let raw = self
            .post("listinvoices", json!({ "payment_hash": payment_hash }))
            .await?;
        let parsed: InvoicesResponse =
            serde_json::from_value(raw).map_err(|e| ClnError::Rpc(e.to_string()))?;
        Ok(parsed.invoices)
    }

    async fn list_invoices_by_label(&self, label: &str) -> Result<Vec<ClnInvoice>, ClnError> {
        let raw = self.post("listinvoices", json!({ "label": label })).await?;
        let parsed: InvoicesResponse =
            serde_json::from_value(raw).map_err(|e| ClnError::Rpc(e.to_string()))?;
        Ok(parsed.invoices)
    }

    async fn list_pays(&self, payment_hash: &str) -> Result<Vec<ClnPay>, ClnError> {
        let raw = self
            .post("listpays", json!({ "payment_hash": payment_hash }))
            .await?;
        let parsed: PaysResponse =
            serde_json::from_value(raw).map_err(|e| ClnError::Rpc(e.to_string()))?;
        Ok(parsed.pays)
    }

    async fn pay(
        &self,
        bolt11: &str,
        retry_for_seconds: u64,
        max_fee_percent: f64,
    ) -> Result<PayResult, ClnError> {
        let raw = self
            .post(
                "pay",
                json!({
                    "bolt11": bolt11,
                    "retry_for": retry_for_seconds,
                    "maxfeepercent": max_fee_percent,
                }),
            )
            .await?;
        serde_json::from_value(raw).map_err(|e| ClnError::Rpc(e.to_string()))
    }

    async fn create_invoice(
        &self,
        amount_sats: u64,
        label: &str,
        description: &str,
        expiry_seconds: u64,
    ) -> Result<CreatedInvoice, ClnError> {
        let raw = self
            .post(
                "invoice",
                json!({
                    "amount_msat": format!("{amount_sats}sat"),
                    "label": label,
                    "description": description,
                    "expiry": expiry_seconds,
                    "deschashonly": false,
                }),
            )
            .await?;
        serde_json::from_value(raw).map_err(|e| ClnError::Rpc(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rune_read_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rune");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "  abc123  ").unwrap();

        let client = ClnRestClient::new("http://localhost:3010/", &path);
        assert_eq!(client.rune().unwrap(), "abc123");
        assert_eq!(client.base_url, "http://localhost:3010");
    }

    #[test]
    fn test_missing_rune_is_auth_error() {
        let client = ClnRestClient::new("http://localhost:3010", Path::new("/nonexistent/rune"));
        assert!(matches!(client.rune(), Err(ClnError::Auth(_))));
    }
}
