use std::collections::HashMap;

use crate::models::MatchPair;

/// Outcome of conflict resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Accepted pairs, strongest first
    pub accepted: Vec<MatchPair>,
    /// Candidates that lost an artwork to a stronger pair
    pub rejected: Vec<MatchPair>,
}

/// Sort candidates strongest first.
///
/// Lower combined score wins; equal scores fall back to the artwork ids so
/// the order never depends on how the votes were read.
pub fn rank_candidates(candidates: &mut [MatchPair]) {
    candidates.sort_by(|a, b| {
        a.combined_score
            .cmp(&b.combined_score)
            .then_with(|| a.artwork1_id.cmp(&b.artwork1_id))
            .then_with(|| a.artwork2_id.cmp(&b.artwork2_id))
    });
}

/// Greedily pick a conflict-free set of pairs.
///
/// Candidates are ranked, then accepted in order unless one of their
/// artworks was already claimed by an earlier pair.
pub fn resolve_conflicts(mut candidates: Vec<MatchPair>) -> Resolution {
    rank_candidates(&mut candidates);

    let mut claimed: HashMap<String, bool> = HashMap::with_capacity(candidates.len() * 2);
    let mut resolution = Resolution::default();

    for pair in candidates {
        let taken = |id: &str| claimed.get(id).copied().unwrap_or(false);
        if taken(&pair.artwork1_id) || taken(&pair.artwork2_id) {
            tracing::debug!(
                "Rejecting {} <-> {} (score {}): artwork already claimed",
                pair.artwork1_id,
                pair.artwork2_id,
                pair.combined_score
            );
            resolution.rejected.push(pair);
            continue;
        }

        claimed.insert(pair.artwork1_id.clone(), true);
        claimed.insert(pair.artwork2_id.clone(), true);
        resolution.accepted.push(pair);
    }

    resolution
}
