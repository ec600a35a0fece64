//! Contribution registry
//!
//! Read/write access to the artifact collection, expressed against the
//! `ArtifactStore` trait so the query layer can be swapped out in tests.
//! Fetches are retried a bounded number of times and enforce visibility at
//! the boundary, so callers only ever see records the viewer may see.

pub mod reconcile;

pub use reconcile::{contribution_from_doc, is_wallet_shaped, Contribution, UNKNOWN_CONTRIBUTOR};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use tracing::{debug, warn};

use crate::authz;
use crate::config::Args;
use crate::db::schemas::{ArtifactDoc, VerificationStatus, ARCHIVE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::identity::{CredentialSet, Identity, OperatorAllowlist, SessionEpoch};
use crate::types::{ArchwayError, Result};

/// Persistence seam for artifact rows
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn find_by_wallet(&self, address: &str) -> Result<Vec<ArtifactDoc>>;
    async fn find_by_social(&self, subject: &str) -> Result<Vec<ArtifactDoc>>;
    async fn find_all(&self) -> Result<Vec<ArtifactDoc>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ArtifactDoc>>;
    async fn insert(&self, doc: ArtifactDoc) -> Result<String>;
    async fn update_status_by_wallet(
        &self,
        address: &str,
        status: VerificationStatus,
    ) -> Result<u64>;
    async fn update_status_by_social(
        &self,
        subject: &str,
        status: VerificationStatus,
    ) -> Result<u64>;
    /// Hard delete. Returns false when no row matched.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;
}

/// MongoDB-backed artifact store
#[derive(Clone)]
pub struct MongoArtifactStore {
    collection: MongoCollection<ArtifactDoc>,
}

fn regex_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if !c.is_ascii_alphanumeric() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Fetch filter for a wallet key: case-insensitive exact match across every
/// column a wallet key may have landed in, including the social-id column
/// where legacy writes misplaced it. Over-matching here is fine; ownership is
/// re-derived after reconciliation.
fn wallet_fetch_filter(address: &str) -> Document {
    let pattern = format!("^{}$", regex_escape(address));
    doc! {
        "$or": [
            { "wallet_address": { "$regex": &pattern, "$options": "i" } },
            { "owner_value": { "$regex": &pattern, "$options": "i" } },
            { "user_id": { "$regex": &pattern, "$options": "i" } },
        ]
    }
}

/// Fetch filter for a social subject id. Legacy rows stored numeric ids, so a
/// parsed integer alternative is included, and the wallet column is checked
/// for misplaced social keys.
fn social_fetch_filter(subject: &str) -> Document {
    let mut alternatives = vec![
        doc! { "user_id": subject },
        doc! { "discord_id": subject },
        doc! { "owner_value": subject },
        doc! { "wallet_address": subject },
    ];
    if let Ok(numeric) = subject.parse::<i64>() {
        alternatives.push(doc! { "user_id": numeric });
        alternatives.push(doc! { "discord_id": numeric });
    }
    doc! { "$or": alternatives }
}

/// Update filter for the wallet key space. Narrower than the fetch filter:
/// the normalized owner column only counts when the key was written as a
/// wallet, so a status sweep by wallet never touches social rows.
fn wallet_update_filter(address: &str) -> Document {
    let pattern = format!("^{}$", regex_escape(address));
    doc! {
        "$or": [
            { "wallet_address": { "$regex": &pattern, "$options": "i" } },
            { "owner_kind": "wallet", "owner_value": { "$regex": &pattern, "$options": "i" } },
        ]
    }
}

/// Update filter for the social key space
fn social_update_filter(subject: &str) -> Document {
    let mut alternatives = vec![
        doc! { "user_id": subject },
        doc! { "discord_id": subject },
        doc! { "owner_kind": "social", "owner_value": subject },
    ];
    if let Ok(numeric) = subject.parse::<i64>() {
        alternatives.push(doc! { "user_id": numeric });
        alternatives.push(doc! { "discord_id": numeric });
    }
    doc! { "$or": alternatives }
}

impl MongoArtifactStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<ArtifactDoc>(ARCHIVE_COLLECTION).await?;
        Ok(Self { collection })
    }

    fn newest_first() -> Option<Document> {
        Some(doc! { "created_at": -1 })
    }
}

#[async_trait]
impl ArtifactStore for MongoArtifactStore {
    async fn find_by_wallet(&self, address: &str) -> Result<Vec<ArtifactDoc>> {
        self.collection
            .find_many_sorted(wallet_fetch_filter(address), Self::newest_first())
            .await
    }

    async fn find_by_social(&self, subject: &str) -> Result<Vec<ArtifactDoc>> {
        self.collection
            .find_many_sorted(social_fetch_filter(subject), Self::newest_first())
            .await
    }

    async fn find_all(&self) -> Result<Vec<ArtifactDoc>> {
        self.collection
            .find_many_sorted(doc! {}, Self::newest_first())
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArtifactDoc>> {
        let oid = ObjectId::parse_str(id)
            .map_err(|_| ArchwayError::BadRequest(format!("Invalid artifact id: {}", id)))?;
        self.collection.find_one(doc! { "_id": oid }).await
    }

    async fn insert(&self, doc: ArtifactDoc) -> Result<String> {
        let id = self.collection.insert_one(doc).await?;
        Ok(id.to_hex())
    }

    async fn update_status_by_wallet(
        &self,
        address: &str,
        status: VerificationStatus,
    ) -> Result<u64> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "metadata.updated_at": bson::DateTime::now(),
            }
        };
        let result = self
            .collection
            .update_many(wallet_update_filter(address), update)
            .await?;
        Ok(result.modified_count)
    }

    async fn update_status_by_social(
        &self,
        subject: &str,
        status: VerificationStatus,
    ) -> Result<u64> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "metadata.updated_at": bson::DateTime::now(),
            }
        };
        let result = self
            .collection
            .update_many(social_update_filter(subject), update)
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let oid = ObjectId::parse_str(id)
            .map_err(|_| ArchwayError::BadRequest(format!("Invalid artifact id: {}", id)))?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }
}

/// Registry facade: retries, reconciliation, and fetch-boundary authorization
#[derive(Clone)]
pub struct ContributionRegistry {
    store: Arc<dyn ArtifactStore>,
    allowlist: OperatorAllowlist,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ContributionRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>, allowlist: OperatorAllowlist, args: &Args) -> Self {
        Self {
            store,
            allowlist,
            // validated to be at least 1 at startup
            max_attempts: args.registry_max_attempts.max(1),
            retry_delay: Duration::from_millis(args.registry_retry_delay_ms),
        }
    }

    pub fn allowlist(&self) -> &OperatorAllowlist {
        &self.allowlist
    }

    /// Fetch the raw rows owned by one identity, retrying transient failures.
    /// The final failure maps to `RegistryUnavailable` so callers can render
    /// a degraded state instead of a hard error.
    async fn fetch_docs(&self, identity: &Identity) -> Result<Vec<ArtifactDoc>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match identity {
                Identity::Wallet { address } => self.store.find_by_wallet(address).await,
                Identity::Social { subject, .. } => self.store.find_by_social(subject).await,
                Identity::Anonymous => return Ok(Vec::new()),
            };

            match result {
                Ok(docs) => {
                    debug!(attempt, count = docs.len(), "registry fetch succeeded");
                    return Ok(docs);
                }
                Err(err) if attempt < self.max_attempts => {
                    warn!(attempt, error = %err, "registry fetch failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    return Err(ArchwayError::RegistryUnavailable(err.to_string()));
                }
            }
        }
    }

    async fn fetch_docs_by_key(&self, subject_key: &str) -> Result<Vec<ArtifactDoc>> {
        let identity = if is_wallet_shaped(subject_key) {
            Identity::wallet(subject_key)
        } else {
            Identity::Social {
                subject: subject_key.to_string(),
                display_name: None,
                avatar_url: None,
            }
        };
        self.fetch_docs(&identity).await
    }

    /// All contributions owned by `identity`, newest first.
    ///
    /// Anonymous identities own nothing and always resolve to an empty set.
    pub async fn fetch_contributions(&self, identity: &Identity) -> Result<Vec<Contribution>> {
        let docs = self.fetch_docs(identity).await?;
        Ok(newest_first(docs.iter().map(contribution_from_doc).collect()))
    }

    /// Contributions grouped under `subject_key`, filtered down to what
    /// `viewer` is allowed to see. Nothing invisible leaves this call.
    pub async fn fetch_profile(
        &self,
        viewer: &CredentialSet,
        subject_key: &str,
    ) -> Result<Vec<Contribution>> {
        let docs = self.fetch_docs_by_key(subject_key).await?;
        let held = viewer.identities();

        let visible = docs
            .iter()
            .map(contribution_from_doc)
            .filter(|record| owned_by_key(record, subject_key))
            .filter(|record| authz::can_view_any(&held, record, &self.allowlist).visible)
            .collect();

        Ok(newest_first(visible))
    }

    /// `fetch_contributions` guarded by a session epoch snapshot.
    ///
    /// Returns `Ok(None)` when the session changed while the fetch was in
    /// flight; the caller discards the stale result silently instead of
    /// applying records from a previous login.
    pub async fn fetch_contributions_guarded(
        &self,
        identity: &Identity,
        epoch: &SessionEpoch,
        snapshot: u64,
    ) -> Result<Option<Vec<Contribution>>> {
        let records = self.fetch_contributions(identity).await?;
        if !epoch.accepts(snapshot) {
            debug!("discarding fetch result from a stale session");
            return Ok(None);
        }
        Ok(Some(records))
    }

    /// Every contribution `viewer` is allowed to see, newest first. Backs the
    /// public gallery; the visibility filter runs here at the fetch boundary.
    pub async fn fetch_visible(&self, viewer: &CredentialSet) -> Result<Vec<Contribution>> {
        let records = self.fetch_all().await?;
        let held = viewer.identities();
        Ok(records
            .into_iter()
            .filter(|record| authz::can_view_any(&held, record, &self.allowlist).visible)
            .collect())
    }

    /// Every contribution in the archive, newest first. Operator surface only;
    /// callers gate access before invoking this.
    pub async fn fetch_all(&self) -> Result<Vec<Contribution>> {
        let mut attempt = 0;
        let docs = loop {
            attempt += 1;
            match self.store.find_all().await {
                Ok(docs) => break docs,
                Err(err) if attempt < self.max_attempts => {
                    warn!(attempt, error = %err, "registry fetch failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(ArchwayError::RegistryUnavailable(err.to_string())),
            }
        };
        Ok(newest_first(docs.iter().map(contribution_from_doc).collect()))
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }
}

/// True iff the reconciled record belongs to the requested profile key.
/// Query filters over-match on purpose (legacy columns); this is the
/// authoritative post-reconciliation check.
fn owned_by_key(record: &Contribution, subject_key: &str) -> bool {
    if is_wallet_shaped(subject_key) {
        record
            .owner_wallet
            .as_deref()
            .is_some_and(|owner| owner.eq_ignore_ascii_case(subject_key))
    } else {
        record
            .owner_social
            .as_deref()
            .is_some_and(|owner| owner == subject_key)
    }
}

fn newest_first(mut records: Vec<Contribution>) -> Vec<Contribution> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ContentType, WALLET_SENTINEL};
    use crate::identity::SocialSession;
    use crate::test_support::MemoryArtifactStore;

    fn args() -> Args {
        use clap::Parser;
        Args::parse_from(["archway", "--mongodb-uri", "mongodb://localhost:27017"])
    }

    fn registry(store: Arc<MemoryArtifactStore>, allowlist: OperatorAllowlist) -> ContributionRegistry {
        let mut cfg = args();
        cfg.registry_retry_delay_ms = 0;
        ContributionRegistry::new(store, allowlist, &cfg)
    }

    fn wallet_doc(address: &str, description: &str) -> ArtifactDoc {
        let mut doc = ArtifactDoc::new_upload(
            &Identity::wallet(address),
            ContentType::Meme,
            description.to_string(),
            "https://cdn/a.png".to_string(),
            "uploads/a.png".to_string(),
            None,
            true,
        );
        doc.created_at = Some(bson::DateTime::now());
        doc
    }

    fn social_doc(subject: &str, description: &str) -> ArtifactDoc {
        let mut doc = ArtifactDoc::new_upload(
            &Identity::Social {
                subject: subject.to_string(),
                display_name: Some("Fan".to_string()),
                avatar_url: None,
            },
            ContentType::Art,
            description.to_string(),
            "https://cdn/b.png".to_string(),
            "uploads/b.png".to_string(),
            None,
            true,
        );
        doc.created_at = Some(bson::DateTime::now());
        doc
    }

    fn wallet_creds(address: &str) -> CredentialSet {
        CredentialSet::new(Some(address.to_string()), None)
    }

    #[tokio::test]
    async fn test_anonymous_fetch_is_empty_without_touching_store() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.fail_next(10);
        let registry = registry(store, OperatorAllowlist::default());

        let records = registry
            .fetch_contributions(&Identity::Anonymous)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.push(wallet_doc("0xabc", "kept")).await;
        store.fail_next(1);
        let registry = registry(store, OperatorAllowlist::default());

        let records = registry
            .fetch_contributions(&Identity::wallet("0xABC"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_map_to_registry_unavailable() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.fail_next(10);
        let registry = registry(store, OperatorAllowlist::default());

        let err = registry
            .fetch_contributions(&Identity::wallet("0xabc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchwayError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_profile_hides_private_records_from_strangers() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.push(wallet_doc("0xabc", "private")).await;
        let mut public = wallet_doc("0xabc", "public");
        public.is_encrypted = false;
        store.push(public).await;
        let registry = registry(store, OperatorAllowlist::default());

        let stranger = wallet_creds("0x999");
        let visible = registry.fetch_profile(&stranger, "0xabc").await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].description, "public");
    }

    #[tokio::test]
    async fn test_profile_shows_owner_everything() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.push(wallet_doc("0xAbC", "private")).await;
        let registry = registry(store, OperatorAllowlist::default());

        // Owner arrives with different casing
        let owner = wallet_creds("0xABC");
        let visible = registry.fetch_profile(&owner, "0xabc").await.unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_key_shape_selects_lookup_column() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.push(social_doc("835774287997698058", "social upload")).await;
        let registry = registry(
            store,
            OperatorAllowlist::new(vec![], vec!["835774287997698058".to_string()]),
        );

        let viewer = CredentialSet::new(
            None,
            Some(SocialSession {
                identities: vec![crate::identity::ProviderIdentity {
                    provider: "discord".to_string(),
                    id: "835774287997698058".to_string(),
                }],
                user_metadata: Default::default(),
            }),
        );
        let visible = registry
            .fetch_profile(&viewer, "835774287997698058")
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_sentinel_rows_resolve_to_social_profile() {
        let store = Arc::new(MemoryArtifactStore::default());
        let mut legacy = ArtifactDoc {
            wallet_address: Some(WALLET_SENTINEL.to_string()),
            user_id: Some("424242".to_string()),
            description: "legacy".to_string(),
            is_encrypted: false,
            ..Default::default()
        };
        legacy.created_at = Some(bson::DateTime::now());
        store.push(legacy).await;
        let registry = registry(store, OperatorAllowlist::default());

        let visible = registry
            .fetch_profile(&CredentialSet::default(), "424242")
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].group_key(), "424242");
    }

    #[tokio::test]
    async fn test_logout_mid_fetch_discards_the_result() {
        let store = Arc::new(MemoryArtifactStore::default());
        store.push(wallet_doc("0xabc", "stale")).await;
        let registry = registry(store, OperatorAllowlist::default());
        let epoch = SessionEpoch::new();

        let snapshot = epoch.current();
        epoch.invalidate();

        let result = registry
            .fetch_contributions_guarded(&Identity::wallet("0xabc"), &epoch, snapshot)
            .await
            .unwrap();
        assert!(result.is_none());

        let fresh = registry
            .fetch_contributions_guarded(&Identity::wallet("0xabc"), &epoch, epoch.current())
            .await
            .unwrap();
        assert_eq!(fresh.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_results_are_newest_first() {
        let store = Arc::new(MemoryArtifactStore::default());
        let mut older = wallet_doc("0xabc", "older");
        older.created_at = Some(bson::DateTime::from_millis(1_000));
        let mut newer = wallet_doc("0xabc", "newer");
        newer.created_at = Some(bson::DateTime::from_millis(2_000));
        store.push(older).await;
        store.push(newer).await;
        let registry = registry(store, OperatorAllowlist::default());

        let records = registry
            .fetch_contributions(&Identity::wallet("0xabc"))
            .await
            .unwrap();
        assert_eq!(records[0].description, "newer");
        assert_eq!(records[1].description, "older");
    }

    #[test]
    fn test_wallet_fetch_filter_spans_legacy_columns() {
        let filter = wallet_fetch_filter("0xAbC");
        let alternatives = filter.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 3);
    }

    #[test]
    fn test_social_fetch_filter_includes_numeric_alternative() {
        let filter = social_fetch_filter("835774287997698058");
        let alternatives = filter.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 6);

        let filter = social_fetch_filter("not-numeric");
        let alternatives = filter.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 4);
    }

    #[test]
    fn test_update_filters_stay_in_their_key_space() {
        let wallet = wallet_update_filter("0xabc");
        assert_eq!(wallet.get_array("$or").unwrap().len(), 2);

        let social = social_update_filter("424242");
        // No wallet_address alternative in the social update path
        for alt in social.get_array("$or").unwrap() {
            let alt = alt.as_document().unwrap();
            assert!(!alt.contains_key("wallet_address"));
        }
    }
}
