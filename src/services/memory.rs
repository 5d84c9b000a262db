use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::models::{
    EventPhase, MatchRecord, NewMatch, NotificationKind, UpsertOutcome, Vote, VoteRecord,
};
use crate::services::MatchStore;

/// Errors raised by the in-memory store
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Notification captured by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNotification {
    pub id: String,
    pub artist_id: String,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Default)]
struct State {
    artists: HashSet<String>,
    events: HashMap<String, EventPhase>,
    /// artwork id -> owning artist id
    artworks: HashMap<String, String>,
    votes: Vec<Vote>,
    matches: Vec<MatchRecord>,
    notifications: Vec<StoredNotification>,
    failing_pairs: HashSet<String>,
    fail_loads: bool,
}

/// Process-local `MatchStore` with the same semantics as the Postgres one.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, MemoryStoreError> {
        self.state.lock().map_err(|_| MemoryStoreError::Poisoned)
    }

    pub fn add_artist(&self, artist_id: &str) -> Result<(), MemoryStoreError> {
        self.lock()?.artists.insert(artist_id.to_string());
        Ok(())
    }

    pub fn add_event(&self, event_id: &str, phase: EventPhase) -> Result<(), MemoryStoreError> {
        self.lock()?.events.insert(event_id.to_string(), phase);
        Ok(())
    }

    pub fn set_phase(&self, event_id: &str, phase: EventPhase) -> Result<(), MemoryStoreError> {
        self.add_event(event_id, phase)
    }

    pub fn add_artwork(&self, artwork_id: &str, owner_id: &str) -> Result<(), MemoryStoreError> {
        self.lock()?
            .artworks
            .insert(artwork_id.to_string(), owner_id.to_string());
        Ok(())
    }

    pub fn add_vote(&self, vote: Vote) -> Result<(), MemoryStoreError> {
        self.lock()?.votes.push(vote);
        Ok(())
    }

    /// Insert a match directly, bypassing the conflict checks
    pub fn insert_match(&self, record: MatchRecord) -> Result<(), MemoryStoreError> {
        self.lock()?.matches.push(record);
        Ok(())
    }

    /// Make every upsert of the given pair fail
    pub fn fail_upserts_for(&self, pair_key: &str) -> Result<(), MemoryStoreError> {
        self.lock()?.failing_pairs.insert(pair_key.to_string());
        Ok(())
    }

    /// Make every vote load fail
    pub fn fail_loads(&self) -> Result<(), MemoryStoreError> {
        self.lock()?.fail_loads = true;
        Ok(())
    }

    pub fn matches(&self) -> Result<Vec<MatchRecord>, MemoryStoreError> {
        Ok(self.lock()?.matches.clone())
    }

    pub fn notifications(&self) -> Result<Vec<StoredNotification>, MemoryStoreError> {
        Ok(self.lock()?.notifications.clone())
    }
}

impl MatchStore for InMemoryStore {
    type Error = MemoryStoreError;

    async fn load_finalized_likes(&self, event_id: &str) -> Result<Vec<VoteRecord>, Self::Error> {
        let state = self.lock()?;
        if state.fail_loads {
            return Err(MemoryStoreError::Injected("vote load".to_string()));
        }

        let records = state
            .votes
            .iter()
            .filter(|v| v.event_id == event_id && v.liked && v.finalized_at.is_some())
            .map(|v| VoteRecord {
                vote_id: v.id.clone(),
                event_id: v.event_id.clone(),
                voter_id: v.artist_id.clone(),
                voter_exists: state.artists.contains(&v.artist_id),
                artwork_id: v.artwork_id.clone(),
                artwork_owner_id: state.artworks.get(&v.artwork_id).cloned(),
                liked: v.liked,
                preference_order: v.preference_order,
                finalized_at: v.finalized_at,
            })
            .collect();

        Ok(records)
    }

    async fn event_phase(&self, event_id: &str) -> Result<Option<EventPhase>, Self::Error> {
        Ok(self.lock()?.events.get(event_id).copied())
    }

    async fn upsert_match(&self, new_match: &NewMatch) -> Result<UpsertOutcome, Self::Error> {
        let mut state = self.lock()?;
        if state.failing_pairs.contains(&new_match.pair_key) {
            return Err(MemoryStoreError::Injected(format!(
                "upsert {}",
                new_match.pair_key
            )));
        }

        let same_pair = state.matches.iter().find(|m| {
            m.event_id == new_match.event_id
                && m.has_artworks(&new_match.artwork1_id, &new_match.artwork2_id)
        });
        if let Some(existing) = same_pair {
            return Ok(UpsertOutcome::Unchanged {
                match_id: existing.id.clone(),
            });
        }

        let claimed = state.matches.iter().find_map(|m| {
            if m.event_id != new_match.event_id {
                return None;
            }
            [&new_match.artwork1_id, &new_match.artwork2_id]
                .into_iter()
                .find(|id| **id == m.artwork1_id || **id == m.artwork2_id)
                .map(|id| (id.clone(), m.id.clone()))
        });
        if let Some((artwork_id, existing_match_id)) = claimed {
            return Ok(UpsertOutcome::Conflict {
                artwork_id,
                existing_match_id,
            });
        }

        let match_id = uuid::Uuid::new_v4().to_string();
        state.matches.push(MatchRecord {
            id: match_id.clone(),
            event_id: new_match.event_id.clone(),
            artwork1_id: new_match.artwork1_id.clone(),
            artwork2_id: new_match.artwork2_id.clone(),
            pair_key: new_match.pair_key.clone(),
            status: new_match.status.clone(),
            created_at: Utc::now(),
        });

        Ok(UpsertOutcome::Created { match_id })
    }

    async fn list_matches(&self, event_id: &str) -> Result<Vec<MatchRecord>, Self::Error> {
        Ok(self
            .lock()?
            .matches
            .iter()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn create_notification(
        &self,
        artist_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> Result<String, Self::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        self.lock()?.notifications.push(StoredNotification {
            id: id.clone(),
            artist_id: artist_id.to_string(),
            kind,
            message: message.to_string(),
        });
        Ok(id)
    }

    async fn health_check(&self) -> Result<bool, Self::Error> {
        Ok(self.lock().is_ok())
    }
}
