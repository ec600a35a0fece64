//! Document schemas for the archive database

pub mod artifact;
pub mod metadata;

pub use artifact::{ArtifactDoc, ContentType, VerificationStatus, ARCHIVE_COLLECTION, WALLET_SENTINEL};
pub use metadata::Metadata;
