use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU32;

/// A voter's preference for a liked artwork.
///
/// Rank 1 is the most preferred. A vote finalized without an order is
/// `Unranked` and sorts after every ranked value, however large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Option<u32>", into = "Option<u32>")]
pub enum PreferenceRank {
    Ranked(NonZeroU32),
    Unranked,
}

impl PreferenceRank {
    /// Build a rank from a positive integer. Zero yields `None`.
    pub fn ranked(order: u32) -> Option<Self> {
        NonZeroU32::new(order).map(Self::Ranked)
    }

    /// Interpret a stored, nullable preference column.
    ///
    /// Non-positive values are malformed and handed back as the error.
    pub fn from_stored(order: Option<i32>) -> Result<Self, i32> {
        match order {
            None => Ok(Self::Unranked),
            Some(value) => u32::try_from(value)
                .ok()
                .and_then(Self::ranked)
                .ok_or(value),
        }
    }

    pub fn order(self) -> Option<u32> {
        match self {
            Self::Ranked(n) => Some(n.get()),
            Self::Unranked => None,
        }
    }
}

impl From<PreferenceRank> for Option<u32> {
    fn from(rank: PreferenceRank) -> Self {
        rank.order()
    }
}

impl TryFrom<Option<u32>> for PreferenceRank {
    type Error = String;

    fn try_from(value: Option<u32>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Self::Unranked),
            Some(order) => Self::ranked(order)
                .ok_or_else(|| "preference order must be a positive integer".to_string()),
        }
    }
}

impl fmt::Display for PreferenceRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranked(n) => write!(f, "{}", n),
            Self::Unranked => f.write_str("unranked"),
        }
    }
}

/// Combined strength of a reciprocal pair; lower is stronger.
///
/// Pairs with fewer unranked sides always come first, then the sum of the
/// ranked sides decides. Two rank-1 votes combine to a ranked total of 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedScore {
    pub unranked: u8,
    pub ranked_total: u32,
}

impl CombinedScore {
    pub fn of(first: PreferenceRank, second: PreferenceRank) -> Self {
        let mut score = Self { unranked: 0, ranked_total: 0 };
        for rank in [first, second] {
            match rank.order() {
                Some(order) => score.ranked_total = score.ranked_total.saturating_add(order),
                None => score.unranked += 1,
            }
        }
        score
    }

    /// The plain sum of both orders, when both sides are ranked.
    pub fn total(self) -> Option<u32> {
        (self.unranked == 0).then_some(self.ranked_total)
    }
}

impl Ord for CombinedScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unranked
            .cmp(&other.unranked)
            .then_with(|| self.ranked_total.cmp(&other.ranked_total))
    }
}

impl PartialOrd for CombinedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CombinedScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unranked {
            0 => write!(f, "{}", self.ranked_total),
            n => write!(f, "{} (+{} unranked)", self.ranked_total, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(n: u32) -> PreferenceRank {
        PreferenceRank::ranked(n).unwrap()
    }

    #[test]
    fn test_unranked_sorts_after_large_ranks() {
        assert!(rank(1) < rank(2));
        assert!(rank(1_000_000) < PreferenceRank::Unranked);
    }

    #[test]
    fn test_from_stored_rejects_non_positive() {
        assert_eq!(PreferenceRank::from_stored(None), Ok(PreferenceRank::Unranked));
        assert_eq!(PreferenceRank::from_stored(Some(3)), Ok(rank(3)));
        assert_eq!(PreferenceRank::from_stored(Some(0)), Err(0));
        assert_eq!(PreferenceRank::from_stored(Some(-4)), Err(-4));
    }

    #[test]
    fn test_combined_score_ordering() {
        let strong = CombinedScore::of(rank(1), rank(1));
        let weaker = CombinedScore::of(rank(1), rank(2));
        let half_ranked = CombinedScore::of(rank(1), PreferenceRank::Unranked);
        let unranked = CombinedScore::of(PreferenceRank::Unranked, PreferenceRank::Unranked);

        assert_eq!(strong.total(), Some(2));
        assert!(strong < weaker);
        assert!(CombinedScore::of(rank(500), rank(500)) < half_ranked);
        assert!(half_ranked < unranked);
        assert_eq!(unranked.total(), None);
    }

    #[test]
    fn test_rank_serializes_as_nullable_number() {
        assert_eq!(serde_json::to_string(&rank(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&PreferenceRank::Unranked).unwrap(), "null");
        assert!(serde_json::from_str::<PreferenceRank>("0").is_err());
    }
}
