//! Credential adapter
//!
//! Normalizes the two raw credential sources (wallet address, social-login
//! session) into a canonical `Identity`. Resolution is a pure function over
//! the inputs; it never fetches and it never fails. A session that yields no
//! usable subject id degrades to `Anonymous` rather than half-resolving.

use serde::{Deserialize, Serialize};

/// One entry of the provider session's linked-identity list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub provider: String,
    pub id: String,
}

/// Display metadata carried at the top level of the session payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Provider-scoped subject id (fallback extraction path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Social-login session payload as forwarded by the frontend.
///
/// The upstream provider nests the stable subject id inconsistently, so two
/// extraction paths are supported: the linked-identity list first, then the
/// top-level metadata field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialSession {
    #[serde(default)]
    pub identities: Vec<ProviderIdentity>,

    #[serde(default)]
    pub user_metadata: SessionMetadata,
}

impl SocialSession {
    /// Extract the stable subject id, or None if neither path yields one.
    ///
    /// Never derived from the mutable display name.
    pub fn subject_id(&self) -> Option<&str> {
        self.identities
            .iter()
            .find(|ident| ident.provider == "discord")
            .map(|ident| ident.id.as_str())
            .or(self.user_metadata.provider_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Canonical representation of "who is acting".
///
/// A closed variant: every consumer must handle all three cases. Constructed
/// fresh per request from whichever credential source is available; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Connected wallet. Address is lowercased at construction.
    Wallet { address: String },
    /// Social login with a provider-scoped stable subject id.
    Social {
        subject: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
    },
    /// No usable credential.
    Anonymous,
}

impl Identity {
    /// Build a wallet identity, normalizing the address to lowercase
    pub fn wallet(address: &str) -> Self {
        Identity::Wallet {
            address: address.to_lowercase(),
        }
    }

    /// The single comparison key, or None for Anonymous
    pub fn key(&self) -> Option<&str> {
        match self {
            Identity::Wallet { address } => Some(address),
            Identity::Social { subject, .. } => Some(subject),
            Identity::Anonymous => None,
        }
    }

    /// Best-effort human label
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Identity::Wallet { address } => Some(address),
            Identity::Social { display_name, .. } => display_name.as_deref(),
            Identity::Anonymous => None,
        }
    }

    pub fn avatar_url(&self) -> Option<&str> {
        match self {
            Identity::Social { avatar_url, .. } => avatar_url.as_deref(),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Everything the visitor currently holds.
///
/// A visitor may have a connected wallet, a social session, both, or neither.
/// Ownership checks are an OR across whichever credentials are held, not a
/// merged super-identity.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    pub wallet_address: Option<String>,
    pub session: Option<SocialSession>,
}

impl CredentialSet {
    pub fn new(wallet_address: Option<String>, session: Option<SocialSession>) -> Self {
        Self {
            wallet_address,
            session,
        }
    }

    /// Resolve the canonical identity for this visitor.
    ///
    /// Social session takes precedence. A session object with no extractable
    /// subject id resolves to Anonymous even when present.
    pub fn resolve(&self) -> Identity {
        if let Some(ref session) = self.session {
            return match session.subject_id() {
                Some(subject) => Identity::Social {
                    subject: subject.to_string(),
                    display_name: session.user_metadata.full_name.clone(),
                    avatar_url: session.user_metadata.avatar_url.clone(),
                },
                None => Identity::Anonymous,
            };
        }

        match self.wallet_address {
            Some(ref address) if !address.is_empty() => Identity::wallet(address),
            _ => Identity::Anonymous,
        }
    }

    /// Every non-anonymous identity this visitor can currently prove.
    ///
    /// Used for ownership checks: a visitor holding both a wallet and a
    /// social session owns a record if either credential matches it.
    pub fn identities(&self) -> Vec<Identity> {
        let mut held = Vec::new();

        if let Some(ref session) = self.session {
            if let Some(subject) = session.subject_id() {
                held.push(Identity::Social {
                    subject: subject.to_string(),
                    display_name: session.user_metadata.full_name.clone(),
                    avatar_url: session.user_metadata.avatar_url.clone(),
                });
            }
        }

        if let Some(ref address) = self.wallet_address {
            if !address.is_empty() {
                held.push(Identity::wallet(address));
            }
        }

        held
    }
}
