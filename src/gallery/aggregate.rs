//! Contributor aggregation
//!
//! Folds a flat list of contributions into per-contributor summaries. Grouping
//! keys come from reconciled owner keys, so a contributor's legacy and modern
//! rows land in the same bucket. The fold is pure and deterministic: the same
//! input always yields the same summaries in the same order.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::registry::{is_wallet_shaped, Contribution, UNKNOWN_CONTRIBUTOR};

/// One contributor with all of their visible records
#[derive(Debug, Clone, Serialize)]
pub struct ContributorSummary {
    /// Reconciled owner key the records are grouped under
    pub key: String,
    pub display_name: String,
    pub avatar_url: String,
    /// Newest first
    pub records: Vec<Contribution>,
    /// True iff any record in the group is verified
    pub verified: bool,
}

/// Shorten a wallet key for display, keeping both ends recognizable
fn truncate_wallet(key: &str) -> String {
    if key.len() <= 10 {
        return key.to_string();
    }
    format!("{}…{}", &key[..6], &key[key.len() - 4..])
}

fn fallback_display_name(key: &str) -> String {
    if key == UNKNOWN_CONTRIBUTOR {
        return "Unknown Contributor".to_string();
    }
    if is_wallet_shaped(key) {
        return truncate_wallet(key);
    }
    let prefix: String = key.chars().take(8).collect();
    format!("User {}", prefix)
}

/// Deterministic placeholder avatar for contributors with no snapshot.
/// Seeded from the group key so reloads render the same image.
fn placeholder_avatar(key: &str) -> String {
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    format!(
        "https://api.dicebear.com/7.x/identicon/svg?seed={}",
        &digest[..16]
    )
}

/// Group contributions by owner and derive per-contributor display fields.
///
/// Input records may arrive in any order; within each group the newest record
/// wins display-field conflicts. Groups are ordered by their newest record,
/// newest first, with the key as a stable tie-break.
pub fn aggregate_contributors(records: Vec<Contribution>) -> Vec<ContributorSummary> {
    let mut groups: HashMap<String, Vec<Contribution>> = HashMap::new();
    for record in records {
        groups
            .entry(record.group_key().to_string())
            .or_default()
            .push(record);
    }

    let mut summaries: Vec<ContributorSummary> = groups
        .into_iter()
        .map(|(key, mut group)| {
            group.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

            let display_name = group
                .iter()
                .find_map(|record| record.display_name.clone())
                .unwrap_or_else(|| fallback_display_name(&key));

            let avatar_url = group
                .iter()
                .find_map(|record| record.avatar_url.clone())
                .unwrap_or_else(|| placeholder_avatar(&key));

            let verified = group.iter().any(Contribution::is_verified);

            ContributorSummary {
                key,
                display_name,
                avatar_url,
                records: group,
                verified,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        let a_newest = a.records.first().map(|r| r.created_at);
        let b_newest = b.records.first().map(|r| r.created_at);
        b_newest.cmp(&a_newest).then(a.key.cmp(&b.key))
    });

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ContentType, VerificationStatus};
    use chrono::{TimeZone, Utc};

    fn record(
        id: &str,
        wallet: Option<&str>,
        social: Option<&str>,
        at_secs: i64,
    ) -> Contribution {
        Contribution {
            id: id.to_string(),
            owner_wallet: wallet.map(str::to_string),
            owner_social: social.map(str::to_string),
            content_type: ContentType::Meme,
            description: String::new(),
            image_url: None,
            image_path: None,
            message_link: None,
            private: false,
            status: VerificationStatus::Pending,
            created_at: Utc.timestamp_opt(at_secs, 0).unwrap(),
            display_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_empty_input_yields_no_contributors() {
        assert!(aggregate_contributors(Vec::new()).is_empty());
    }

    #[test]
    fn test_records_group_by_owner_key() {
        let records = vec![
            record("a", Some("0xabc"), None, 10),
            record("b", Some("0xabc"), None, 20),
            record("c", None, Some("424242"), 15),
        ];

        let summaries = aggregate_contributors(records);
        assert_eq!(summaries.len(), 2);
        // Ordered by newest record in each group
        assert_eq!(summaries[0].key, "0xabc");
        assert_eq!(summaries[0].records.len(), 2);
        assert_eq!(summaries[0].records[0].id, "b");
        assert_eq!(summaries[1].key, "424242");
    }

    #[test]
    fn test_reconciled_legacy_rows_merge_with_modern_rows() {
        // Same social owner, one row reconciled from legacy columns and one
        // written normalized. Both carry the same owner key by the time they
        // reach aggregation, so they form a single contributor.
        let records = vec![
            record("legacy", None, Some("424242"), 5),
            record("modern", None, Some("424242"), 50),
        ];

        let summaries = aggregate_contributors(records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].records.len(), 2);
    }

    #[test]
    fn test_newest_display_snapshot_wins() {
        let mut older = record("a", None, Some("42"), 10);
        older.display_name = Some("OldName".to_string());
        let mut newer = record("b", None, Some("42"), 20);
        newer.display_name = Some("NewName".to_string());

        let summaries = aggregate_contributors(vec![older, newer]);
        assert_eq!(summaries[0].display_name, "NewName");
    }

    #[test]
    fn test_wallet_display_name_is_truncated() {
        let records = vec![record(
            "a",
            Some("0xadb9577555e75ebc5f22da1ae28482be344b2081"),
            None,
            10,
        )];
        let summaries = aggregate_contributors(records);
        assert_eq!(summaries[0].display_name, "0xadb9…2081");
    }

    #[test]
    fn test_social_fallback_display_name() {
        let records = vec![record("a", None, Some("835774287997698058"), 10)];
        let summaries = aggregate_contributors(records);
        assert_eq!(summaries[0].display_name, "User 83577428");
    }

    #[test]
    fn test_placeholder_avatar_is_deterministic() {
        let first = aggregate_contributors(vec![record("a", Some("0xabc"), None, 10)]);
        let second = aggregate_contributors(vec![record("b", Some("0xabc"), None, 99)]);
        assert_eq!(first[0].avatar_url, second[0].avatar_url);

        let other = aggregate_contributors(vec![record("c", Some("0xdef"), None, 10)]);
        assert_ne!(first[0].avatar_url, other[0].avatar_url);
    }

    #[test]
    fn test_any_verified_record_marks_the_contributor() {
        let mut verified = record("a", Some("0xabc"), None, 10);
        verified.status = VerificationStatus::Verified;
        let pending = record("b", Some("0xabc"), None, 20);

        let summaries = aggregate_contributors(vec![verified, pending]);
        assert!(summaries[0].verified);
    }

    #[test]
    fn test_ownerless_rows_fall_into_unknown_bucket() {
        let records = vec![record("a", None, None, 10), record("b", None, None, 20)];
        let summaries = aggregate_contributors(records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].key, UNKNOWN_CONTRIBUTOR);
        assert_eq!(summaries[0].display_name, "Unknown Contributor");
    }

    #[test]
    fn test_reaggregating_flattened_output_is_stable() {
        let mut verified = record("a", Some("0xabc"), None, 10);
        verified.status = VerificationStatus::Verified;
        let records = vec![
            verified,
            record("b", None, Some("42"), 20),
            record("c", Some("0xabc"), None, 30),
        ];

        let first = aggregate_contributors(records);
        let flattened: Vec<Contribution> = first
            .iter()
            .flat_map(|summary| summary.records.clone())
            .collect();
        let second = aggregate_contributors(flattened);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.display_name, b.display_name);
            assert_eq!(a.avatar_url, b.avatar_url);
            assert_eq!(a.verified, b.verified);
            assert_eq!(a.records, b.records);
        }
    }

    #[test]
    fn test_aggregation_is_order_insensitive() {
        let forward = vec![
            record("a", Some("0xabc"), None, 10),
            record("b", None, Some("42"), 20),
            record("c", Some("0xabc"), None, 30),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let left = aggregate_contributors(forward);
        let right = aggregate_contributors(reversed);
        let left_keys: Vec<_> = left.iter().map(|s| s.key.clone()).collect();
        let right_keys: Vec<_> = right.iter().map(|s| s.key.clone()).collect();
        assert_eq!(left_keys, right_keys);
    }
}
