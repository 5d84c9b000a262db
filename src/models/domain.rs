use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::preference::{CombinedScore, PreferenceRank};

/// Status written on every match the engine creates
pub const MATCH_STATUS_COMPLETED: &str = "completed";

/// Lifecycle phase of a swap event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPhase {
    Open,
    Voting,
    Closed,
    Archived,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Open => "open",
            EventPhase::Voting => "voting",
            EventPhase::Closed => "closed",
            EventPhase::Archived => "archived",
        }
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(EventPhase::Open),
            "voting" => Ok(EventPhase::Voting),
            "closed" => Ok(EventPhase::Closed),
            "archived" => Ok(EventPhase::Archived),
            other => Err(format!("unknown event phase: {}", other)),
        }
    }
}

/// A vote cast by an artist on an artwork within an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub artist_id: String,
    pub artwork_id: String,
    pub event_id: String,
    pub liked: bool,
    pub preference_order: Option<i32>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Vote {
    /// A finalized like, ready for matching
    pub fn liked(artist_id: &str, artwork_id: &str, event_id: &str, preference_order: Option<i32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            artist_id: artist_id.to_string(),
            artwork_id: artwork_id.to_string(),
            event_id: event_id.to_string(),
            liked: true,
            preference_order,
            finalized_at: Some(Utc::now()),
        }
    }

    pub fn unfinalized(mut self) -> Self {
        self.finalized_at = None;
        self
    }

    pub fn disliked(mut self) -> Self {
        self.liked = false;
        self
    }
}

/// A vote row as read from the store, joined with its artwork and voter.
///
/// `artwork_owner_id` is `None` when the referenced artwork is missing and
/// `voter_exists` is false when the voting artist is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub vote_id: String,
    pub event_id: String,
    pub voter_id: String,
    pub voter_exists: bool,
    pub artwork_id: String,
    pub artwork_owner_id: Option<String>,
    pub liked: bool,
    pub preference_order: Option<i32>,
    pub finalized_at: Option<DateTime<Utc>>,
}

/// A finalized like that passed data-integrity checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedVote {
    pub vote_id: String,
    pub voter_id: String,
    pub artwork_id: String,
    pub owner_id: String,
    pub rank: PreferenceRank,
}

/// Why a loaded vote was left out of matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    MissingArtwork,
    MissingVoter,
    InvalidPreferenceOrder { value: i32 },
    SelfVote,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingArtwork => f.write_str("artwork not found"),
            SkipReason::MissingVoter => f.write_str("voting artist not found"),
            SkipReason::InvalidPreferenceOrder { value } => {
                write!(f, "invalid preference order {}", value)
            }
            SkipReason::SelfVote => f.write_str("artist voted on their own artwork"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedVote {
    pub vote_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A reciprocal pair of artworks.
///
/// `artwork1_id` is always the lexicographically smaller id. `artist1_id`
/// owns `artwork1_id`, and `artist1_preference` is the rank artist 1 gave to
/// `artwork2_id` (and vice versa).
///
/// On the wire `combinedScore` is an object `{unranked, rankedTotal}`, not a
/// plain number: unranked sides are counted instead of being folded into the
/// sum as a large placeholder. `rankedTotal` equals the plain sum of both
/// orders when `unranked` is 0. Preference orders serialize as a number, or
/// `null` when unranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPair {
    pub artwork1_id: String,
    pub artwork2_id: String,
    pub artist1_id: String,
    pub artist2_id: String,
    #[serde(rename = "artist1PreferenceOrder")]
    pub artist1_preference: PreferenceRank,
    #[serde(rename = "artist2PreferenceOrder")]
    pub artist2_preference: PreferenceRank,
    pub combined_score: CombinedScore,
}

impl MatchPair {
    /// Order-independent identity of the pair
    pub fn pair_key(&self) -> String {
        pair_key(&self.artwork1_id, &self.artwork2_id)
    }

    pub fn contains(&self, artwork_id: &str) -> bool {
        self.artwork1_id == artwork_id || self.artwork2_id == artwork_id
    }
}

/// Build the order-independent key for two artwork ids.
///
/// The smaller id is length-prefixed, so ids containing `:` cannot collide:
/// `("a", "b:c")` gives `1:a:b:c`, `("a:b", "c")` gives `3:a:b:c`.
pub fn pair_key(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}:{}", first.len(), first, second)
}

/// Match row to be written by the persister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub event_id: String,
    pub artwork1_id: String,
    pub artwork2_id: String,
    pub pair_key: String,
    pub status: String,
}

impl NewMatch {
    pub fn completed(event_id: &str, pair: &MatchPair) -> Self {
        Self {
            event_id: event_id.to_string(),
            artwork1_id: pair.artwork1_id.clone(),
            artwork2_id: pair.artwork2_id.clone(),
            pair_key: pair.pair_key(),
            status: MATCH_STATUS_COMPLETED.to_string(),
        }
    }
}

/// A persisted match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub event_id: String,
    pub artwork1_id: String,
    pub artwork2_id: String,
    pub pair_key: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// True when this match joins exactly these two artworks, in either order
    pub fn has_artworks(&self, a: &str, b: &str) -> bool {
        (self.artwork1_id == a && self.artwork2_id == b)
            || (self.artwork1_id == b && self.artwork2_id == a)
    }
}

/// Result of a single match upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum UpsertOutcome {
    #[serde(rename_all = "camelCase")]
    Created { match_id: String },
    #[serde(rename_all = "camelCase")]
    Unchanged { match_id: String },
    /// One of the artworks already belongs to another match of the event
    #[serde(rename_all = "camelCase")]
    Conflict {
        artwork_id: String,
        existing_match_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Match,
    Event,
    Flag,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key("art-b", "art-a"), "5:art-a:art-b");
        assert_eq!(pair_key("art-a", "art-b"), "5:art-a:art-b");
    }

    #[test]
    fn test_pair_key_separator_in_ids() {
        assert_ne!(pair_key("a", "b:c"), pair_key("a:b", "c"));
        assert_ne!(pair_key("x:", "y"), pair_key("x", ":y"));
    }

    #[test]
    fn test_match_pair_same_artworks() {
        let record = MatchRecord {
            id: "m1".to_string(),
            event_id: "event".to_string(),
            artwork1_id: "a:b".to_string(),
            artwork2_id: "c".to_string(),
            pair_key: pair_key("a:b", "c"),
            status: MATCH_STATUS_COMPLETED.to_string(),
            created_at: Utc::now(),
        };

        assert!(record.has_artworks("c", "a:b"));
        assert!(!record.has_artworks("a", "b:c"));
    }

    #[test]
    fn test_event_phase_parsing() {
        assert_eq!("Closed".parse::<EventPhase>(), Ok(EventPhase::Closed));
        assert!("finished".parse::<EventPhase>().is_err());
        assert_eq!(EventPhase::Voting.to_string(), "voting");
    }

    #[test]
    fn test_match_pair_wire_format() {
        let pair = MatchPair {
            artwork1_id: "a".to_string(),
            artwork2_id: "b".to_string(),
            artist1_id: "x".to_string(),
            artist2_id: "y".to_string(),
            artist1_preference: PreferenceRank::ranked(1).unwrap(),
            artist2_preference: PreferenceRank::Unranked,
            combined_score: CombinedScore::of(
                PreferenceRank::ranked(1).unwrap(),
                PreferenceRank::Unranked,
            ),
        };

        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["artwork1Id"], "a");
        assert_eq!(json["artist1PreferenceOrder"], 1);
        assert!(json["artist2PreferenceOrder"].is_null());
        assert_eq!(json["combinedScore"]["unranked"], 1);
    }
}
