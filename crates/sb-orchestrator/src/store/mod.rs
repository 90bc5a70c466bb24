//! # Document Store
//!
//! One JSON document on disk holds all off-chain bridge state: `{users,
//! addresses, invoices, nonces, payments}`. Mutations reload the document
//! from disk, apply under a coarse lock, and persist atomically via
//! write-to-temp-then-rename; readers get the last durable snapshot.

use crate::domain::{InvoiceRecord, OrchestratorError, PaymentRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
    /// Registered users.
    #[serde(default)]
    pub users: Map<String, Value>,
    /// Saved credit addresses.
    #[serde(default)]
    pub addresses: Map<String, Value>,
    /// Issued invoices by label.
    #[serde(default)]
    pub invoices: BTreeMap<String, InvoiceRecord>,
    /// Miscellaneous counters.
    #[serde(default)]
    pub nonces: Map<String, Value>,
    /// Payment records by hash (lowercase hex, no prefix).
    #[serde(default)]
    pub payments: BTreeMap<String, PaymentRecord>,
}

/// Single-writer JSON store.
pub struct DocumentStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl DocumentStore {
    /// Open a store at `path`, creating the parent directory if needed.
    pub fn open(path: &Path) -> Result<Self, OrchestratorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| OrchestratorError::Store(format!("{}: {e}", parent.display())))?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Read the last durable snapshot. A missing file is an empty
    /// document.
    pub async fn read(&self) -> Result<Document, OrchestratorError> {
        let _guard = self.lock.lock().await;
        self.load()
    }

    /// Reload, apply one mutation, and persist atomically. Returns
    /// whatever the mutation returns.
    pub async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Document) -> T,
    ) -> Result<T, OrchestratorError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load()?;
        let out = apply(&mut document);
        self.persist(&document)?;
        Ok(out)
    }

    fn load(&self) -> Result<Document, OrchestratorError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| OrchestratorError::Store(format!("corrupt document: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(OrchestratorError::Store(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn persist(&self, document: &Document) -> Result<(), OrchestratorError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| OrchestratorError::Store(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &bytes)
            .map_err(|e| OrchestratorError::Store(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| OrchestratorError::Store(format!("{}: {e}", self.path.display())))?;
        debug!("[sb-store] persisted {} bytes", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentStatus;

    fn store_in(dir: &tempfile::TempDir) -> DocumentStore {
        DocumentStore::open(&dir.path().join("state/bridge.json")).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let document = store.read().await.unwrap();
        assert!(document.payments.is_empty());
        assert!(document.invoices.is_empty());
    }

    #[tokio::test]
    async fn test_parent_directory_created() {
        let dir = tempfile::tempdir().unwrap();
        let _store = store_in(&dir);
        assert!(dir.path().join("state").is_dir());
    }

    #[tokio::test]
    async fn test_mutation_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .mutate(|doc| {
                let mut record = PaymentRecord::new("0xab", "ab", 100);
                record.set_status(PaymentStatus::Received, 100);
                doc.payments.insert("ab".to_string(), record);
            })
            .await
            .unwrap();

        let document = store.read().await.unwrap();
        assert_eq!(document.payments["ab"].status, PaymentStatus::Received);
    }

    #[tokio::test]
    async fn test_reload_before_apply_sees_prior_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .mutate(|doc| {
                doc.payments
                    .insert("aa".to_string(), PaymentRecord::new("0xaa", "aa", 1));
            })
            .await
            .unwrap();

        // A second handle over the same file must observe the first write.
        let other = store_in(&dir);
        let seen = other.mutate(|doc| doc.payments.len()).await.unwrap();
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.mutate(|_| {}).await.unwrap();
        assert!(dir.path().join("state/bridge.json").exists());
        assert!(!dir.path().join("state/bridge.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("state/bridge.json"), b"{not json").unwrap();
        assert!(store.read().await.is_err());
    }
}
