// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    pair_key, EventPhase, LikedVote, MatchPair, MatchRecord, NewMatch, NotificationKind,
    SkipReason, SkippedVote, UpsertOutcome, Vote, VoteRecord, MATCH_STATUS_COMPLETED,
};
pub use requests::{CalculateMatchesRequest, EventPath};
pub use responses::{
    CalculateMatchesResponse, ErrorResponse, HealthResponse, ListMatchesResponse, PairFailure,
};
