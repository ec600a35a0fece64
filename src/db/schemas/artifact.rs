//! Artifact document schema
//!
//! One uploaded artifact row in the `archives` collection. The schema is
//! faithful to the historical shape of the data, which is messy: the social
//! key column sometimes holds numbers, the wallet column sometimes holds the
//! legacy `"Discord-User"` sentinel, and some very old rows carry neither
//! owner key. Deserialization must tolerate all of it; interpretation of the
//! mess is centralized in `registry::reconcile`, not here.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::identity::Identity;

/// Collection name for artifacts
pub const ARCHIVE_COLLECTION: &str = "archives";

/// Legacy placeholder written into `wallet_address` for social-only uploads
pub const WALLET_SENTINEL: &str = "Discord-User";

/// Artifact content classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    ChatLog,
    Art,
    Meme,
    /// Legacy free-text value predating the closed set
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::ChatLog => "chat-log",
            ContentType::Art => "art",
            ContentType::Meme => "meme",
            ContentType::Other(s) => s,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "chat-log" => ContentType::ChatLog,
            "art" => ContentType::Art,
            "meme" => ContentType::Meme,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Other(String::new())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ContentType::parse(&raw))
    }
}

/// Review status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
        }
    }
}

impl Serialize for VerificationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VerificationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Unknown legacy values degrade to pending rather than failing the row
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "verified" => VerificationStatus::Verified,
            _ => VerificationStatus::Pending,
        })
    }
}

/// Deserialize an optional string field tolerating numeric legacy values
fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

/// Artifact document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ArtifactDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Social-login subject id of the uploader. Numeric in some legacy rows.
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,

    /// Uploader wallet address, or the legacy sentinel placeholder
    #[serde(default)]
    pub wallet_address: Option<String>,

    /// Redundant social id snapshot carried by some legacy rows
    #[serde(default, deserialize_with = "string_or_number")]
    pub discord_id: Option<String>,

    /// Normalized owner key kind, written since the schema cleanup
    /// ("wallet" | "social"). Absent on legacy rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_kind: Option<String>,

    /// Normalized owner key value matching `owner_kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_value: Option<String>,

    #[serde(default)]
    pub content_type: ContentType,

    #[serde(default)]
    pub description: String,

    /// Public URL of the stored image
    #[serde(default)]
    pub image_url: Option<String>,

    /// Object path inside the storage bucket, needed for deletion
    #[serde(default)]
    pub image_path: Option<String>,

    /// Optional external proof link (message or post URL)
    #[serde(default)]
    pub message_link: Option<String>,

    /// Visibility flag; restricted to owner and operators when set
    #[serde(default = "default_true")]
    pub is_encrypted: bool,

    #[serde(default)]
    pub status: VerificationStatus,

    /// Row-level creation timestamp carried over from the legacy schema.
    /// New rows also set `metadata.created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// Display snapshot denormalized at upload time
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub discord_username: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ArtifactDoc {
    /// Create a new artifact row for an upload, writing the normalized owner
    /// key alongside the historical columns.
    pub fn new_upload(
        uploader: &Identity,
        content_type: ContentType,
        description: String,
        image_url: String,
        image_path: String,
        message_link: Option<String>,
        is_encrypted: bool,
    ) -> Self {
        let now = DateTime::now();
        let mut doc = Self {
            _id: None,
            metadata: Metadata::new(),
            content_type,
            description,
            image_url: Some(image_url),
            image_path: Some(image_path),
            message_link,
            is_encrypted,
            status: VerificationStatus::Pending,
            created_at: Some(now),
            ..Default::default()
        };

        match uploader {
            Identity::Wallet { address } => {
                doc.wallet_address = Some(address.clone());
                doc.owner_kind = Some("wallet".to_string());
                doc.owner_value = Some(address.clone());
            }
            Identity::Social {
                subject,
                display_name,
                avatar_url,
            } => {
                doc.user_id = Some(subject.clone());
                doc.discord_id = Some(subject.clone());
                doc.owner_kind = Some("social".to_string());
                doc.owner_value = Some(subject.clone());
                doc.discord_username = display_name.clone();
                doc.username = display_name.clone();
                doc.avatar_url = avatar_url.clone();
            }
            Identity::Anonymous => {}
        }

        doc
    }

    /// Document id as a string, if persisted
    pub fn id(&self) -> Option<String> {
        self._id.map(|oid| oid.to_hex())
    }
}

impl IntoIndexes for ArtifactDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "wallet_address": 1 },
                Some(
                    IndexOptions::builder()
                        .name("wallet_address_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ArtifactDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
