use serde::Serialize;
use thiserror::Error;

use crate::core::{
    detector::detect_mutual_likes,
    loader::shape_votes,
    persister::{persist_matches, PersistReport},
    resolver::resolve_conflicts,
};
use crate::models::{MatchPair, SkippedVote, VoteRecord};
use crate::services::MatchStore;

/// Errors that abort a matching run
#[derive(Debug, Error)]
pub enum MatchError<E: std::error::Error + 'static> {
    #[error("Failed to load votes for event {event_id}: {source}")]
    LoadVotes {
        event_id: String,
        #[source]
        source: E,
    },
}

/// Result of detection and resolution, before anything is written
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    /// Accepted pairs, strongest first
    pub matches: Vec<MatchPair>,
    pub skipped_votes: Vec<SkippedVote>,
    pub rejected_candidates: usize,
    pub eligible_votes: usize,
}

/// Result of a full matching run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRun {
    pub event_id: String,
    pub matches: Vec<MatchPair>,
    pub report: PersistReport,
    pub skipped_votes: Vec<SkippedVote>,
    pub rejected_candidates: usize,
}

/// Run detection and resolution over raw vote rows.
///
/// # Pipeline Stages
/// 1. Shape rows into eligible likes, skipping malformed records
/// 2. Detect reciprocal pairs
/// 3. Resolve conflicts, strongest pairs first
pub fn compute_matches(records: Vec<VoteRecord>) -> MatchPlan {
    let loaded = shape_votes(records);
    let candidates = detect_mutual_likes(&loaded.votes);
    let resolution = resolve_conflicts(candidates);

    MatchPlan {
        matches: resolution.accepted,
        skipped_votes: loaded.skipped,
        rejected_candidates: resolution.rejected.len(),
        eligible_votes: loaded.votes.len(),
    }
}

/// Match-calculation engine bound to a store
///
/// Runs for the same event must not overlap; callers serialize them.
#[derive(Debug, Clone)]
pub struct Matcher<S> {
    store: S,
}

impl<S: MatchStore> Matcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Calculate and persist the matches of an event
    ///
    /// Loading the votes is the only step that can fail the run. Persistence
    /// failures are collected per pair in the returned report.
    pub async fn calculate_matches(&self, event_id: &str) -> Result<MatchRun, MatchError<S::Error>> {
        let records = self
            .store
            .load_finalized_likes(event_id)
            .await
            .map_err(|source| MatchError::LoadVotes {
                event_id: event_id.to_string(),
                source,
            })?;

        let loaded_count = records.len();
        let plan = compute_matches(records);

        tracing::debug!(
            "Event {}: {} rows loaded, {} eligible likes, {} skipped",
            event_id,
            loaded_count,
            plan.eligible_votes,
            plan.skipped_votes.len()
        );

        let report = persist_matches(&self.store, event_id, &plan.matches).await;

        tracing::info!(
            "Matched event {}: {} pairs ({} created, {} unchanged, {} conflicts, {} failed), {} votes skipped, {} candidates rejected",
            event_id,
            plan.matches.len(),
            report.created(),
            report.unchanged(),
            report.conflicts(),
            report.failed(),
            plan.skipped_votes.len(),
            plan.rejected_candidates
        );

        Ok(MatchRun {
            event_id: event_id.to_string(),
            matches: plan.matches,
            report,
            skipped_votes: plan.skipped_votes,
            rejected_candidates: plan.rejected_candidates,
        })
    }
}
