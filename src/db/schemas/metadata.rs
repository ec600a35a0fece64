//! Write-tracking metadata embedded in every archive document
//!
//! The archive hard-deletes rows, but earlier tooling retired rows in place
//! by flagging them. Reads honor the flag so a retired row never resurfaces
//! in the gallery.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Timestamps and the legacy retirement flag
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Set by earlier archive tooling when a row was retired in place.
    /// Finds treat flagged rows as absent.
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata for a new upload
    pub fn new() -> Self {
        Self {
            is_deleted: false,
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }
}
