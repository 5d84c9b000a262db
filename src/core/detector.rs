use std::collections::HashMap;

use crate::core::preference::CombinedScore;
use crate::models::{LikedVote, MatchPair};

/// Find every reciprocal pair of artworks in a set of finalized likes.
///
/// Votes are indexed by `(voter, owner)`: the likes one artist gave to
/// another artist's artworks. For each vote the index is probed for the
/// reverse edge, so the pass is linear in the number of votes plus the
/// number of pairs found. Each unordered pair is emitted once, oriented so
/// that `artwork1_id < artwork2_id`.
pub fn detect_mutual_likes(votes: &[LikedVote]) -> Vec<MatchPair> {
    let mut index: HashMap<(&str, &str), Vec<&LikedVote>> = HashMap::new();
    for vote in votes {
        index
            .entry((vote.voter_id.as_str(), vote.owner_id.as_str()))
            .or_default()
            .push(vote);
    }

    let mut pairs = Vec::new();

    for vote in votes {
        // Self-votes never form a pair, even if a malformed record slips through
        if vote.voter_id == vote.owner_id {
            continue;
        }

        let Some(reverse) = index.get(&(vote.owner_id.as_str(), vote.voter_id.as_str())) else {
            continue;
        };

        for back in reverse {
            // Emit from the side holding the larger artwork id only
            if back.artwork_id >= vote.artwork_id {
                continue;
            }

            // back: owner of vote.artwork liked back.artwork (owned by vote.voter)
            pairs.push(MatchPair {
                artwork1_id: back.artwork_id.clone(),
                artwork2_id: vote.artwork_id.clone(),
                artist1_id: vote.voter_id.clone(),
                artist2_id: vote.owner_id.clone(),
                artist1_preference: vote.rank,
                artist2_preference: back.rank,
                combined_score: CombinedScore::of(vote.rank, back.rank),
            });
        }
    }

    tracing::debug!(
        "Detected {} reciprocal pairs from {} votes",
        pairs.len(),
        votes.len()
    );

    pairs
}
