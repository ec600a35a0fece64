//! In-memory fakes for registry and storage seams

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::Mutex;

use crate::db::schemas::{ArtifactDoc, VerificationStatus};
use crate::registry::ArtifactStore;
use crate::storage::{BlobRef, BlobStore};
use crate::types::{ArchwayError, Result};

/// Artifact store over a Vec, with injectable transient failures
#[derive(Default)]
pub(crate) struct MemoryArtifactStore {
    docs: Mutex<Vec<ArtifactDoc>>,
    failures: AtomicU32,
}

impl MemoryArtifactStore {
    /// Make the next `n` store calls fail
    pub(crate) fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ArchwayError::Database("injected failure".to_string()));
        }
        Ok(())
    }

    /// Seed a row, assigning it an id
    pub(crate) async fn push(&self, mut doc: ArtifactDoc) -> String {
        let oid = ObjectId::new();
        doc._id = Some(oid);
        self.docs.lock().await.push(doc);
        oid.to_hex()
    }

    pub(crate) async fn len(&self) -> usize {
        self.docs.lock().await.len()
    }

    pub(crate) async fn get(&self, id: &str) -> Option<ArtifactDoc> {
        self.docs
            .lock()
            .await
            .iter()
            .find(|doc| doc.id().as_deref() == Some(id))
            .cloned()
    }
}

fn matches_wallet(doc: &ArtifactDoc, address: &str) -> bool {
    [&doc.wallet_address, &doc.owner_value, &doc.user_id]
        .into_iter()
        .any(|column| {
            column
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(address))
        })
}

fn matches_social(doc: &ArtifactDoc, subject: &str) -> bool {
    [
        &doc.user_id,
        &doc.discord_id,
        &doc.owner_value,
        &doc.wallet_address,
    ]
    .into_iter()
    .any(|column| column.as_deref() == Some(subject))
}

fn matches_wallet_update(doc: &ArtifactDoc, address: &str) -> bool {
    doc.wallet_address
        .as_deref()
        .is_some_and(|value| value.eq_ignore_ascii_case(address))
        || (doc.owner_kind.as_deref() == Some("wallet")
            && doc
                .owner_value
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(address)))
}

fn matches_social_update(doc: &ArtifactDoc, subject: &str) -> bool {
    doc.user_id.as_deref() == Some(subject)
        || doc.discord_id.as_deref() == Some(subject)
        || (doc.owner_kind.as_deref() == Some("social")
            && doc.owner_value.as_deref() == Some(subject))
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn find_by_wallet(&self, address: &str) -> Result<Vec<ArtifactDoc>> {
        self.check_failure()?;
        Ok(self
            .docs
            .lock()
            .await
            .iter()
            .filter(|doc| matches_wallet(doc, address))
            .cloned()
            .collect())
    }

    async fn find_by_social(&self, subject: &str) -> Result<Vec<ArtifactDoc>> {
        self.check_failure()?;
        Ok(self
            .docs
            .lock()
            .await
            .iter()
            .filter(|doc| matches_social(doc, subject))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<ArtifactDoc>> {
        self.check_failure()?;
        Ok(self.docs.lock().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArtifactDoc>> {
        self.check_failure()?;
        Ok(self.get(id).await)
    }

    async fn insert(&self, doc: ArtifactDoc) -> Result<String> {
        self.check_failure()?;
        Ok(self.push(doc).await)
    }

    async fn update_status_by_wallet(
        &self,
        address: &str,
        status: VerificationStatus,
    ) -> Result<u64> {
        self.check_failure()?;
        let mut docs = self.docs.lock().await;
        let mut updated = 0;
        for doc in docs
            .iter_mut()
            .filter(|doc| matches_wallet_update(doc, address))
        {
            doc.status = status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn update_status_by_social(
        &self,
        subject: &str,
        status: VerificationStatus,
    ) -> Result<u64> {
        self.check_failure()?;
        let mut docs = self.docs.lock().await;
        let mut updated = 0;
        for doc in docs
            .iter_mut()
            .filter(|doc| matches_social_update(doc, subject))
        {
            doc.status = status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        self.check_failure()?;
        let mut docs = self.docs.lock().await;
        let before = docs.len();
        docs.retain(|doc| doc.id().as_deref() != Some(id));
        Ok(docs.len() < before)
    }
}

/// Blob store over a HashMap, with injectable failures
#[derive(Default)]
pub(crate) struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    counter: AtomicU64,
    fail_puts: AtomicU32,
    fail_removes: AtomicU32,
}

impl MemoryBlobStore {
    pub(crate) fn fail_next_put(&self, n: u32) {
        self.fail_puts.store(n, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_remove(&self, n: u32) {
        self.fail_removes.store(n, Ordering::SeqCst);
    }

    pub(crate) async fn contains(&self, path: &str) -> bool {
        self.objects.lock().await.contains_key(path)
    }

    pub(crate) async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        let remaining = counter.load(Ordering::SeqCst);
        if remaining > 0 {
            counter.store(remaining - 1, Ordering::SeqCst);
            return true;
        }
        false
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, file_name: &str, bytes: Vec<u8>, _content_type: &str) -> Result<BlobRef> {
        if Self::take_failure(&self.fail_puts) {
            return Err(ArchwayError::Storage("injected put failure".to_string()));
        }
        let path = format!(
            "{}-{}",
            self.counter.fetch_add(1, Ordering::SeqCst),
            file_name
        );
        self.objects.lock().await.insert(path.clone(), bytes);
        Ok(BlobRef {
            public_url: format!("memory://{}", path),
            path,
        })
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if Self::take_failure(&self.fail_removes) {
            return Err(ArchwayError::Storage("injected remove failure".to_string()));
        }
        // Removing an absent object succeeds, matching the HTTP store
        self.objects.lock().await.remove(path);
        Ok(())
    }
}
