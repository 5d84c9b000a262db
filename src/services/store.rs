//! The `MatchStore` trait: everything the matcher reads from and writes to
//! persistent storage.
//!
//! `PostgresClient` is the production backend; `InMemoryStore` backs the
//! tests and benchmarks.

use std::future::Future;

use crate::models::{EventPhase, MatchRecord, NewMatch, NotificationKind, UpsertOutcome, VoteRecord};

/// Storage seam for the match-calculation engine.
///
/// All methods return `Send` futures so handlers can run on the
/// multi-threaded runtime.
pub trait MatchStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Votes of an event with `liked = true` and a finalization timestamp,
    /// joined with the voted artwork's owner and the voter.
    ///
    /// An unknown event yields an empty list.
    fn load_finalized_likes(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Vec<VoteRecord>, Self::Error>> + Send;

    /// Current phase of an event, `None` if the event does not exist.
    fn event_phase(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Option<EventPhase>, Self::Error>> + Send;

    /// Insert a match unless its pair already exists.
    ///
    /// Returns `Conflict` without writing when either artwork already belongs
    /// to a different match of the same event.
    fn upsert_match(
        &self,
        new_match: &NewMatch,
    ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send;

    /// Persisted matches of an event, oldest first.
    fn list_matches(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Vec<MatchRecord>, Self::Error>> + Send;

    /// Store a notification for an artist; returns its id.
    fn create_notification(
        &self,
        artist_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
