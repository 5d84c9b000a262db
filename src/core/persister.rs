use serde::{Deserialize, Serialize};

use crate::models::{MatchPair, NewMatch, UpsertOutcome};
use crate::services::MatchStore;

/// What happened to one resolved pair during persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PersistStatus {
    #[serde(rename_all = "camelCase")]
    Created { match_id: String },
    #[serde(rename_all = "camelCase")]
    Unchanged { match_id: String },
    #[serde(rename_all = "camelCase")]
    Conflict {
        artwork_id: String,
        existing_match_id: String,
    },
    Failed { error: String },
}

impl From<UpsertOutcome> for PersistStatus {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created { match_id } => PersistStatus::Created { match_id },
            UpsertOutcome::Unchanged { match_id } => PersistStatus::Unchanged { match_id },
            UpsertOutcome::Conflict {
                artwork_id,
                existing_match_id,
            } => PersistStatus::Conflict {
                artwork_id,
                existing_match_id,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairOutcome {
    pub pair: MatchPair,
    #[serde(flatten)]
    pub status: PersistStatus,
}

impl PairOutcome {
    /// True when the pair is stored after this run
    pub fn is_persisted(&self) -> bool {
        matches!(
            self.status,
            PersistStatus::Created { .. } | PersistStatus::Unchanged { .. }
        )
    }
}

/// Aggregated persistence results, in the order the pairs were written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistReport {
    pub outcomes: Vec<PairOutcome>,
}

impl PersistReport {
    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Created { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Unchanged { .. }))
    }

    pub fn conflicts(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Conflict { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Failed { .. }))
    }

    /// Pairs that were not stored, conflicts included
    pub fn failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes.iter().filter(|o| !o.is_persisted())
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(PairOutcome::is_persisted)
    }

    fn count(&self, pred: impl Fn(&PersistStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Upsert one match per accepted pair.
///
/// Pairs are written one after another. A failing pair is recorded and the
/// remaining pairs are still attempted; nothing already written is undone.
pub async fn persist_matches<S: MatchStore>(
    store: &S,
    event_id: &str,
    pairs: &[MatchPair],
) -> PersistReport {
    let mut report = PersistReport {
        outcomes: Vec::with_capacity(pairs.len()),
    };

    for pair in pairs {
        let new_match = NewMatch::completed(event_id, pair);
        let status = match store.upsert_match(&new_match).await {
            Ok(outcome) => PersistStatus::from(outcome),
            Err(e) => PersistStatus::Failed {
                error: e.to_string(),
            },
        };

        match &status {
            PersistStatus::Created { match_id } => {
                tracing::debug!("Created match {} for {}", match_id, new_match.pair_key)
            }
            PersistStatus::Unchanged { match_id } => {
                tracing::debug!("Match {} already exists for {}", match_id, new_match.pair_key)
            }
            PersistStatus::Conflict {
                artwork_id,
                existing_match_id,
            } => tracing::warn!(
                "Not persisting {}: artwork {} already in match {}",
                new_match.pair_key,
                artwork_id,
                existing_match_id
            ),
            PersistStatus::Failed { error } => {
                tracing::warn!("Failed to persist {}: {}", new_match.pair_key, error)
            }
        }

        report.outcomes.push(PairOutcome {
            pair: pair.clone(),
            status,
        });
    }

    report
}
