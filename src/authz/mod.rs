//! Authorization engine
//!
//! Computes per-record visibility decisions. Decisions are advisory for
//! rendering but are also enforced at the fetch boundary by the registry, so
//! private rows never leave the service for viewers who cannot see them.

use serde::Serialize;

use crate::identity::{Identity, OperatorAllowlist};
use crate::registry::Contribution;

/// Why a record is (or is not) visible to a viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessReason {
    Public,
    Owner,
    PrivilegedOperator,
    Denied,
}

/// Visibility decision for one viewer/record pair. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub visible: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            visible: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            visible: false,
            reason: AccessReason::Denied,
        }
    }
}

/// True iff the identity's key matches one of the record's owner keys.
///
/// Wallet keys are compared case-normalized; both owner columns are checked
/// because legacy rows may carry either.
fn owns(viewer: &Identity, record: &Contribution) -> bool {
    match viewer {
        Identity::Wallet { address } => record
            .owner_wallet
            .as_deref()
            .is_some_and(|owner| owner.eq_ignore_ascii_case(address)),
        Identity::Social { subject, .. } => record
            .owner_social
            .as_deref()
            .is_some_and(|owner| owner == subject),
        Identity::Anonymous => false,
    }
}

/// Decide whether `viewer` may see `record`.
///
/// Recomputed for every record independently; a viewer may own some records
/// in a result set and not others.
pub fn can_view(
    viewer: &Identity,
    record: &Contribution,
    allowlist: &OperatorAllowlist,
) -> AccessDecision {
    if !record.private {
        return AccessDecision::allow(AccessReason::Public);
    }

    if owns(viewer, record) {
        return AccessDecision::allow(AccessReason::Owner);
    }

    if allowlist.is_privileged_operator(viewer) {
        return AccessDecision::allow(AccessReason::PrivilegedOperator);
    }

    AccessDecision::deny()
}

/// Decide across every credential the visitor holds.
///
/// Ownership is an OR across held credentials. The most specific granting
/// reason wins: Owner over PrivilegedOperator over Public ordering is not
/// needed since Public short-circuits identically for all viewers.
pub fn can_view_any(
    held: &[Identity],
    record: &Contribution,
    allowlist: &OperatorAllowlist,
) -> AccessDecision {
    if !record.private {
        return AccessDecision::allow(AccessReason::Public);
    }

    if held.iter().any(|identity| owns(identity, record)) {
        return AccessDecision::allow(AccessReason::Owner);
    }

    if allowlist.any_privileged(held) {
        return AccessDecision::allow(AccessReason::PrivilegedOperator);
    }

    AccessDecision::deny()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ContentType, VerificationStatus};
    use chrono::Utc;

    fn record(wallet: Option<&str>, social: Option<&str>, private: bool) -> Contribution {
        Contribution {
            id: "a1".to_string(),
            owner_wallet: wallet.map(|s| s.to_string()),
            owner_social: social.map(|s| s.to_string()),
            content_type: ContentType::Meme,
            description: String::new(),
            image_url: None,
            image_path: None,
            message_link: None,
            private,
            status: VerificationStatus::Pending,
            created_at: Utc::now(),
            display_name: None,
            avatar_url: None,
        }
    }

    fn allowlist() -> OperatorAllowlist {
        OperatorAllowlist::new(
            vec!["0xAAAA".to_string()],
            vec!["835774287997698058".to_string()],
        )
    }

    fn social(subject: &str) -> Identity {
        Identity::Social {
            subject: subject.to_string(),
            display_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_public_records_are_never_gated() {
        let rec = record(Some("0x1"), None, false);
        let list = allowlist();

        for viewer in [
            Identity::Anonymous,
            Identity::wallet("0x9"),
            social("someone"),
        ] {
            let decision = can_view(&viewer, &rec, &list);
            assert!(decision.visible);
            assert_eq!(decision.reason, AccessReason::Public);
        }
    }

    #[test]
    fn test_private_record_denied_to_anonymous() {
        let rec = record(Some("0x1"), None, true);
        let decision = can_view(&Identity::Anonymous, &rec, &allowlist());
        assert!(!decision.visible);
        assert_eq!(decision.reason, AccessReason::Denied);
    }

    #[test]
    fn test_owner_match_is_case_normalized() {
        // Scenario A: uploaded under 0xABC..., viewed as 0xabc...
        let rec = record(Some("0xabcdef0123"), None, true);
        let viewer = Identity::wallet("0xABCDEF0123");
        let decision = can_view(&viewer, &rec, &allowlist());
        assert!(decision.visible);
        assert_eq!(decision.reason, AccessReason::Owner);
    }

    #[test]
    fn test_operator_sees_others_private_records() {
        // Scenario B: allow-listed social subject views someone else's record
        let rec = record(Some("0x1"), None, true);
        let decision = can_view(&social("835774287997698058"), &rec, &allowlist());
        assert!(decision.visible);
        assert_eq!(decision.reason, AccessReason::PrivilegedOperator);
    }

    #[test]
    fn test_non_owner_non_operator_is_denied() {
        let rec = record(Some("0x1"), Some("u1"), true);
        assert!(!can_view(&Identity::wallet("0x2"), &rec, &allowlist()).visible);
        assert!(!can_view(&social("u2"), &rec, &allowlist()).visible);
    }

    #[test]
    fn test_wallet_key_never_matches_social_owner() {
        // A wallet-shaped key stored as a social subject must not grant a
        // wallet viewer ownership through the wrong key space
        let rec = record(None, Some("0x1"), true);
        assert!(!can_view(&Identity::wallet("0x1"), &rec, &allowlist()).visible);
    }

    #[test]
    fn test_ownership_is_or_across_credentials() {
        let rec = record(None, Some("u1"), true);
        let held = vec![Identity::wallet("0x2"), social("u1")];
        let decision = can_view_any(&held, &rec, &allowlist());
        assert!(decision.visible);
        assert_eq!(decision.reason, AccessReason::Owner);
    }

    #[test]
    fn test_owner_reason_wins_over_operator() {
        let rec = record(Some("0xaaaa"), None, true);
        let held = vec![Identity::wallet("0xAAAA")];
        let decision = can_view_any(&held, &rec, &allowlist());
        assert_eq!(decision.reason, AccessReason::Owner);
    }

    #[test]
    fn test_decisions_are_per_record() {
        let list = allowlist();
        let viewer = Identity::wallet("0x1");
        let mine = record(Some("0x1"), None, true);
        let theirs = record(Some("0x2"), None, true);

        assert!(can_view(&viewer, &mine, &list).visible);
        assert!(!can_view(&viewer, &theirs, &list).visible);
    }
}
