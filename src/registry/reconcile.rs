//! Legacy owner-key reconciliation
//!
//! Historical rows stored owner identity inconsistently: a sentinel string in
//! the wallet column for social uploads, wallet hex occasionally landing in
//! the social-id column, numeric social ids, and very old rows with no owner
//! at all. All of that guesswork lives here, in one isolated step that turns
//! an `ArtifactDoc` into a clean `Contribution`. Nothing downstream re-derives
//! owner keys from raw columns.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::db::schemas::{ArtifactDoc, ContentType, VerificationStatus, WALLET_SENTINEL};

/// Group key used for records whose owner cannot be determined
pub const UNKNOWN_CONTRIBUTOR: &str = "unknown";

/// Domain view of one artifact row after reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub id: String,
    /// Lowercased wallet key, sentinel stripped
    pub owner_wallet: Option<String>,
    /// Social-login subject id, string-coerced
    pub owner_social: Option<String>,
    pub content_type: ContentType,
    pub description: String,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub message_link: Option<String>,
    /// Restricted to owner and privileged operators when true
    pub private: bool,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Contribution {
    /// Grouping key: wallet key if present, else social key, else the
    /// unknown-contributor bucket.
    pub fn group_key(&self) -> &str {
        self.owner_wallet
            .as_deref()
            .or(self.owner_social.as_deref())
            .unwrap_or(UNKNOWN_CONTRIBUTOR)
    }

    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

/// True iff the key has the shape of a hex wallet address
pub fn is_wallet_shaped(key: &str) -> bool {
    let rest = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit())
}

/// Resolve the owner keys of a row.
///
/// Modern rows carry a normalized `owner_kind`/`owner_value` pair written at
/// upload time and are taken at face value. Legacy rows go through shape-based
/// recovery of misplaced keys.
fn resolve_owner(doc: &ArtifactDoc) -> (Option<String>, Option<String>) {
    if let (Some(kind), Some(value)) = (doc.owner_kind.as_deref(), doc.owner_value.as_deref()) {
        return match kind {
            "wallet" => (Some(value.to_lowercase()), doc.user_id.clone()),
            "social" => (None, Some(value.to_string())),
            // Unknown kind tag: fall through to legacy recovery
            _ => legacy_owner(doc),
        };
    }

    legacy_owner(doc)
}

fn legacy_owner(doc: &ArtifactDoc) -> (Option<String>, Option<String>) {
    let mut wallet: Option<String> = None;
    let mut social: Option<String> = None;

    if let Some(raw) = doc.wallet_address.as_deref() {
        if raw == WALLET_SENTINEL {
            // Placeholder for a social upload; the real key is elsewhere
        } else if is_wallet_shaped(raw) {
            wallet = Some(raw.to_lowercase());
        } else if !raw.is_empty() {
            // A social id misplaced into the wallet column
            social = Some(raw.to_string());
        }
    }

    if let Some(raw) = doc.user_id.as_deref() {
        if is_wallet_shaped(raw) {
            // Wallet hex misplaced into the social column
            if wallet.is_none() {
                wallet = Some(raw.to_lowercase());
            }
        } else if !raw.is_empty() && social.is_none() {
            social = Some(raw.to_string());
        }
    }

    if social.is_none() {
        if let Some(raw) = doc.discord_id.as_deref() {
            if !raw.is_empty() && !is_wallet_shaped(raw) {
                social = Some(raw.to_string());
            }
        }
    }

    (wallet, social)
}

/// Build the domain view of a persisted row
pub fn contribution_from_doc(doc: &ArtifactDoc) -> Contribution {
    let (owner_wallet, owner_social) = resolve_owner(doc);

    let created_at = doc
        .created_at
        .or(doc.metadata.created_at)
        .map(|dt| dt.to_chrono())
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());

    Contribution {
        id: doc.id().unwrap_or_default(),
        owner_wallet,
        owner_social,
        content_type: doc.content_type.clone(),
        description: doc.description.clone(),
        image_url: doc.image_url.clone(),
        image_path: doc.image_path.clone(),
        message_link: doc.message_link.clone(),
        private: doc.is_encrypted,
        status: doc.status,
        created_at,
        display_name: doc
            .discord_username
            .clone()
            .or_else(|| doc.username.clone()),
        avatar_url: doc.avatar_url.clone(),
    }
}
