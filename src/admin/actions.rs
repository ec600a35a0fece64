//! Administrative actions
//!
//! Deletion and verification, both gated on the privileged-operator
//! allow-list. The authorization check runs before any side effect, so a
//! rejected action leaves storage and database untouched.
//!
//! Deletion is blob-first: the image is removed before the row, so a failure
//! can strand a row pointing at a missing image but never an unreferenced
//! blob the row no longer mentions. The half-done case surfaces as a
//! distinct `PartialDelete` error for operator follow-up. Blob removal
//! treats an already-absent object as removed, so a stranded row can be
//! cleaned up by repeating the delete.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};

use crate::db::schemas::VerificationStatus;
use crate::identity::{CredentialSet, Identity, OperatorAllowlist};
use crate::registry::{ArtifactStore, Contribution};
use crate::storage::BlobStore;
use crate::types::{ArchwayError, Result};

/// Outcome of a verification sweep. `updated == 0` means the key matched no
/// rows, which callers surface rather than treat as success.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VerifyReceipt {
    pub updated: u64,
}

/// Gateway for operator-only mutations
#[derive(Clone)]
pub struct AdminGateway {
    store: Arc<dyn ArtifactStore>,
    blobs: Arc<dyn BlobStore>,
    allowlist: OperatorAllowlist,
}

impl AdminGateway {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        blobs: Arc<dyn BlobStore>,
        allowlist: OperatorAllowlist,
    ) -> Self {
        Self {
            store,
            blobs,
            allowlist,
        }
    }

    /// Resolve the acting operator, or refuse.
    ///
    /// Any held credential on the allow-list qualifies the actor.
    fn authorize(&self, actor: &CredentialSet) -> Result<Identity> {
        actor
            .identities()
            .into_iter()
            .find(|identity| self.allowlist.is_privileged_operator(identity))
            .ok_or_else(|| {
                ArchwayError::Unauthorized("Operator privileges required".to_string())
            })
    }

    /// Delete one contribution: blob first, then the row.
    #[instrument(skip(self, actor, record), fields(id = %record.id))]
    pub async fn delete_contribution(
        &self,
        actor: &CredentialSet,
        record: &Contribution,
    ) -> Result<()> {
        let operator = self.authorize(actor)?;

        if let Some(path) = record.image_path.as_deref() {
            // A storage failure aborts before the row is touched
            self.blobs.remove(path).await?;
        }

        match self.store.delete_by_id(&record.id).await {
            Ok(true) => {
                info!(operator = ?operator.key(), "contribution deleted");
                Ok(())
            }
            Ok(false) => Err(ArchwayError::NotFound(format!(
                "No contribution with id {}",
                record.id
            ))),
            Err(err) => {
                // The blob is already gone; flag the stranded row explicitly
                error!(error = %err, "row delete failed after blob removal");
                Err(ArchwayError::PartialDelete(format!(
                    "Image removed but row {} remains: {}",
                    record.id, err
                )))
            }
        }
    }

    /// Mark every contribution under `owner_key` as verified.
    ///
    /// The wallet column is tried first and the social column only when no
    /// wallet row matched. The two queries stay sequential so a key that is
    /// somehow present in both spaces cannot be double-counted.
    #[instrument(skip(self, actor))]
    pub async fn mark_verified(
        &self,
        actor: &CredentialSet,
        owner_key: &str,
    ) -> Result<VerifyReceipt> {
        let operator = self.authorize(actor)?;

        let updated = self
            .store
            .update_status_by_wallet(&owner_key.to_lowercase(), VerificationStatus::Verified)
            .await?;

        let updated = if updated > 0 {
            updated
        } else {
            self.store
                .update_status_by_social(owner_key, VerificationStatus::Verified)
                .await?
        };

        info!(operator = ?operator.key(), updated, "verification sweep finished");
        Ok(VerifyReceipt { updated })
    }
}
