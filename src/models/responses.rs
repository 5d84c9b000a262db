use serde::{Deserialize, Serialize};

use crate::core::{MatchRun, PersistStatus};
use crate::models::domain::{MatchPair, MatchRecord, SkippedVote};

/// A resolved pair that was not stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairFailure {
    pub artwork1_id: String,
    pub artwork2_id: String,
    #[serde(flatten)]
    pub status: PersistStatus,
}

/// Response for the calculate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateMatchesResponse {
    pub event_id: String,
    pub matches: Vec<MatchPair>,
    pub created: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub failures: Vec<PairFailure>,
    pub skipped_votes: Vec<SkippedVote>,
    pub rejected_candidates: usize,
    pub warnings: Vec<String>,
}

impl CalculateMatchesResponse {
    pub fn from_run(run: MatchRun, mut warnings: Vec<String>) -> Self {
        let failures: Vec<PairFailure> = run
            .report
            .failures()
            .map(|outcome| PairFailure {
                artwork1_id: outcome.pair.artwork1_id.clone(),
                artwork2_id: outcome.pair.artwork2_id.clone(),
                status: outcome.status.clone(),
            })
            .collect();

        if !failures.is_empty() {
            warnings.insert(
                0,
                format!("{} of {} matches could not be stored", failures.len(), run.matches.len()),
            );
        }
        if !run.skipped_votes.is_empty() {
            warnings.push(format!("{} malformed votes were skipped", run.skipped_votes.len()));
        }

        Self {
            created: run.report.created(),
            unchanged: run.report.unchanged(),
            conflicts: run.report.conflicts(),
            event_id: run.event_id,
            matches: run.matches,
            failures,
            skipped_votes: run.skipped_votes,
            rejected_candidates: run.rejected_candidates,
            warnings,
        }
    }
}

/// Response for the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMatchesResponse {
    pub event_id: String,
    pub matches: Vec<MatchRecord>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
