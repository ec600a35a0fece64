//! Identity resolution for Archway
//!
//! Provides:
//! - Credential adapter: wallet address + social session -> canonical Identity
//! - Static operator allow-list loaded once at startup
//! - Session epoch for discarding in-flight work after logout

pub mod allowlist;
pub mod credentials;
pub mod session;

pub use allowlist::OperatorAllowlist;
pub use credentials::{CredentialSet, Identity, ProviderIdentity, SocialSession};
pub use session::SessionEpoch;
