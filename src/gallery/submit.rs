//! Artifact submission
//!
//! Upload flow: resolve the uploader, store the image blob, then persist the
//! row referencing it. The blob goes first so a row never points at a missing
//! image; if the row insert fails the blob is removed best-effort.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::schemas::{ArtifactDoc, ContentType};
use crate::identity::CredentialSet;
use crate::registry::ArtifactStore;
use crate::storage::BlobStore;
use crate::types::{ArchwayError, Result};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const MAX_DESCRIPTION_CHARS: usize = 2000;

/// One submission from the upload form
#[derive(Debug)]
pub struct SubmissionRequest {
    pub file_name: String,
    pub image_bytes: Vec<u8>,
    pub image_mime: String,
    pub kind: ContentType,
    pub description: String,
    pub message_link: Option<String>,
    /// Restrict visibility to the owner and operators
    pub private: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub image_url: String,
}

/// Handles the blob-then-row upload sequence
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn ArtifactStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn ArtifactStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    fn validate(request: &SubmissionRequest) -> Result<()> {
        if request.image_bytes.is_empty() {
            return Err(ArchwayError::BadRequest("Image is required".to_string()));
        }
        if request.image_bytes.len() > MAX_IMAGE_BYTES {
            return Err(ArchwayError::BadRequest(format!(
                "Image exceeds {} byte limit",
                MAX_IMAGE_BYTES
            )));
        }
        if request.description.trim().is_empty() {
            return Err(ArchwayError::BadRequest(
                "Description is required".to_string(),
            ));
        }
        if request.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ArchwayError::BadRequest(
                "Description is too long".to_string(),
            ));
        }
        Ok(())
    }

    /// Store the image and persist the artifact row.
    ///
    /// Anonymous visitors cannot submit; the check happens before any side
    /// effect so a rejected submission leaves nothing behind.
    pub async fn submit(
        &self,
        uploader: &CredentialSet,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt> {
        let identity = uploader.resolve();
        if identity.is_anonymous() {
            return Err(ArchwayError::Unauthorized(
                "Sign in or connect a wallet to submit".to_string(),
            ));
        }

        Self::validate(&request)?;

        let blob = self
            .blobs
            .put(&request.file_name, request.image_bytes, &request.image_mime)
            .await?;

        let doc = ArtifactDoc::new_upload(
            &identity,
            request.kind,
            request.description,
            blob.public_url.clone(),
            blob.path.clone(),
            request.message_link,
            request.private,
        );

        let id = match self.store.insert(doc).await {
            Ok(id) => id,
            Err(err) => {
                // Roll the blob back so no orphan object lingers
                if let Err(cleanup) = self.blobs.remove(&blob.path).await {
                    warn!(path = %blob.path, error = %cleanup, "orphan blob left behind");
                }
                return Err(err);
            }
        };

        info!(%id, owner = ?identity.key(), "artifact submitted");
        Ok(SubmissionReceipt {
            id,
            image_url: blob.public_url,
        })
    }
}
