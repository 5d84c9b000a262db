use std::collections::HashMap;

use crate::core::preference::PreferenceRank;
use crate::models::{LikedVote, SkipReason, SkippedVote, VoteRecord};

/// Votes eligible for matching, plus the records rejected on the way
#[derive(Debug, Clone, Default)]
pub struct LoadedVotes {
    pub votes: Vec<LikedVote>,
    pub skipped: Vec<SkippedVote>,
}

/// Shape raw store rows into votes the detector can use.
///
/// Rows that are not liked or not finalized are dropped silently; the store
/// query should not return them in the first place. Rows that reference a
/// missing artwork or voter, carry a non-positive preference order, or vote
/// on the voter's own artwork are reported as skipped. When one voter liked
/// the same artwork more than once, the most preferred rank wins.
pub fn shape_votes(records: Vec<VoteRecord>) -> LoadedVotes {
    let mut loaded = LoadedVotes::default();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        if !record.liked || record.finalized_at.is_none() {
            continue;
        }

        let reason = match (&record.artwork_owner_id, record.voter_exists) {
            (None, _) => Some(SkipReason::MissingArtwork),
            (Some(_), false) => Some(SkipReason::MissingVoter),
            (Some(owner), true) if *owner == record.voter_id => Some(SkipReason::SelfVote),
            _ => None,
        };
        if let Some(reason) = reason {
            skip(&mut loaded, record.vote_id, reason);
            continue;
        }

        let rank = match PreferenceRank::from_stored(record.preference_order) {
            Ok(rank) => rank,
            Err(value) => {
                skip(
                    &mut loaded,
                    record.vote_id,
                    SkipReason::InvalidPreferenceOrder { value },
                );
                continue;
            }
        };

        let Some(owner_id) = record.artwork_owner_id else {
            continue;
        };

        let key = (record.voter_id.clone(), record.artwork_id.clone());
        if let Some(&index) = seen.get(&key) {
            let existing = &mut loaded.votes[index];
            if rank < existing.rank {
                existing.rank = rank;
                existing.vote_id = record.vote_id;
            }
            continue;
        }

        seen.insert(key, loaded.votes.len());
        loaded.votes.push(LikedVote {
            vote_id: record.vote_id,
            voter_id: record.voter_id,
            artwork_id: record.artwork_id,
            owner_id,
            rank,
        });
    }

    loaded
}

fn skip(loaded: &mut LoadedVotes, vote_id: String, reason: SkipReason) {
    tracing::warn!("Skipping vote {}: {}", vote_id, reason);
    loaded.skipped.push(SkippedVote { vote_id, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, voter: &str, artwork: &str, owner: Option<&str>, order: Option<i32>) -> VoteRecord {
        VoteRecord {
            vote_id: id.to_string(),
            event_id: "event".to_string(),
            voter_id: voter.to_string(),
            voter_exists: true,
            artwork_id: artwork.to_string(),
            artwork_owner_id: owner.map(str::to_string),
            liked: true,
            preference_order: order,
            finalized_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_valid_votes_pass_through() {
        let loaded = shape_votes(vec![
            record("v1", "alice", "art-b", Some("bob"), Some(1)),
            record("v2", "bob", "art-a", Some("alice"), None),
        ]);

        assert_eq!(loaded.votes.len(), 2);
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.votes[0].owner_id, "bob");
        assert_eq!(loaded.votes[1].rank, PreferenceRank::Unranked);
    }

    #[test]
    fn test_unfinalized_and_unliked_are_dropped() {
        let mut pending = record("v1", "alice", "art-b", Some("bob"), Some(1));
        pending.finalized_at = None;
        let mut disliked = record("v2", "bob", "art-a", Some("alice"), Some(1));
        disliked.liked = false;

        let loaded = shape_votes(vec![pending, disliked]);
        assert!(loaded.votes.is_empty());
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_malformed_votes_are_skipped_with_reason() {
        let mut ghost_voter = record("v3", "ghost", "art-a", Some("alice"), Some(1));
        ghost_voter.voter_exists = false;

        let loaded = shape_votes(vec![
            record("v1", "alice", "art-x", None, Some(1)),
            record("v2", "alice", "art-a", Some("alice"), Some(1)),
            ghost_voter,
            record("v4", "bob", "art-a", Some("alice"), Some(0)),
            record("v5", "bob", "art-c", Some("carol"), Some(2)),
        ]);

        assert_eq!(loaded.votes.len(), 1);
        let reasons: Vec<_> = loaded.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::MissingArtwork,
                SkipReason::SelfVote,
                SkipReason::MissingVoter,
                SkipReason::InvalidPreferenceOrder { value: 0 },
            ]
        );
    }

    #[test]
    fn test_duplicate_votes_keep_best_rank() {
        let loaded = shape_votes(vec![
            record("v1", "alice", "art-b", Some("bob"), Some(3)),
            record("v2", "alice", "art-b", Some("bob"), Some(1)),
            record("v3", "alice", "art-b", Some("bob"), None),
        ]);

        assert_eq!(loaded.votes.len(), 1);
        assert_eq!(loaded.votes[0].rank, PreferenceRank::ranked(1).unwrap());
        assert_eq!(loaded.votes[0].vote_id, "v2");
    }
}
