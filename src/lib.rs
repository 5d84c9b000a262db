//! Artswap Matcher - match-calculation engine for artwork swap events
//!
//! Finds mutually liked artworks among the finalized votes of an event,
//! resolves artworks wanted by several artists in favor of the strongest
//! combined preference, and persists a conflict-free matching.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compute_matches, CombinedScore, MatchError, MatchRun, Matcher, PreferenceRank};
pub use models::{MatchPair, MatchRecord, Vote, VoteRecord};
pub use services::{InMemoryStore, MatchStore, PostgresClient};
