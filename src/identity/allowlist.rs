//! Static privileged-operator allow-list
//!
//! Built once at process start from configuration and immutable for the
//! process lifetime. Membership is exact: wallet keys are compared
//! case-normalized, social subject ids verbatim.

use std::collections::HashSet;

use crate::config::Args;
use crate::identity::Identity;

/// Process-wide allow-list of privileged-operator identity keys
#[derive(Debug, Clone, Default)]
pub struct OperatorAllowlist {
    wallet_keys: HashSet<String>,
    social_keys: HashSet<String>,
}

impl OperatorAllowlist {
    /// Build from explicit key lists. Wallet keys are lowercased here so
    /// later membership checks are a plain set lookup.
    pub fn new<W, S>(wallets: W, socials: S) -> Self
    where
        W: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
    {
        Self {
            wallet_keys: wallets.into_iter().map(|w| w.to_lowercase()).collect(),
            social_keys: socials.into_iter().collect(),
        }
    }

    /// Build from startup configuration
    pub fn from_args(args: &Args) -> Self {
        Self::new(args.operator_wallet_list(), args.operator_social_list())
    }

    /// True iff the identity's key appears on the wallet or social list
    pub fn is_privileged_operator(&self, identity: &Identity) -> bool {
        match identity {
            Identity::Wallet { address } => self.wallet_keys.contains(&address.to_lowercase()),
            Identity::Social { subject, .. } => self.social_keys.contains(subject),
            Identity::Anonymous => false,
        }
    }

    /// True iff any of the held credentials is on the allow-list
    pub fn any_privileged(&self, identities: &[Identity]) -> bool {
        identities.iter().any(|i| self.is_privileged_operator(i))
    }

    pub fn is_empty(&self) -> bool {
        self.wallet_keys.is_empty() && self.social_keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.wallet_keys.len() + self.social_keys.len()
    }
}
