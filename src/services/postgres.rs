use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    EventPhase, MatchRecord, NewMatch, NotificationKind, UpsertOutcome, VoteRecord,
};
use crate::services::MatchStore;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// Event phases as stored in the `event_phase` enum type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_phase", rename_all = "lowercase")]
pub enum PgEventPhase {
    Open,
    Voting,
    Closed,
    Archived,
}

impl From<PgEventPhase> for EventPhase {
    fn from(value: PgEventPhase) -> Self {
        match value {
            PgEventPhase::Open => EventPhase::Open,
            PgEventPhase::Voting => EventPhase::Voting,
            PgEventPhase::Closed => EventPhase::Closed,
            PgEventPhase::Archived => EventPhase::Archived,
        }
    }
}

/// Notification kinds as stored in the `notification_kind` enum type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
pub enum PgNotificationKind {
    Match,
    Event,
    Flag,
    Other,
}

impl From<NotificationKind> for PgNotificationKind {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Match => PgNotificationKind::Match,
            NotificationKind::Event => PgNotificationKind::Event,
            NotificationKind::Flag => PgNotificationKind::Flag,
            NotificationKind::Other => PgNotificationKind::Other,
        }
    }
}

/// PostgreSQL-backed store for votes, events and matches
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

impl MatchStore for PostgresClient {
    type Error = PostgresError;

    /// Missing artworks and artists surface as NULL owner / false existence
    /// flags so the loader can report them instead of dropping them.
    async fn load_finalized_likes(&self, event_id: &str) -> Result<Vec<VoteRecord>, Self::Error> {
        let query = r#"
            SELECT
                v.id AS vote_id,
                v.event_id,
                v.artist_id AS voter_id,
                (a.id IS NOT NULL) AS voter_exists,
                v.artwork_id,
                w.artist_id AS artwork_owner_id,
                v.liked,
                v.preference_order,
                v.finalized_at
            FROM votes v
            LEFT JOIN artworks w ON w.id = v.artwork_id
            LEFT JOIN artists a ON a.id = v.artist_id
            WHERE v.event_id = $1
              AND v.liked = TRUE
              AND v.finalized_at IS NOT NULL
            ORDER BY v.finalized_at, v.id
        "#;

        let rows = sqlx::query(query).bind(event_id).fetch_all(&self.pool).await?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(VoteRecord {
                    vote_id: row.try_get("vote_id")?,
                    event_id: row.try_get("event_id")?,
                    voter_id: row.try_get("voter_id")?,
                    voter_exists: row.try_get("voter_exists")?,
                    artwork_id: row.try_get("artwork_id")?,
                    artwork_owner_id: row.try_get("artwork_owner_id")?,
                    liked: row.try_get("liked")?,
                    preference_order: row.try_get("preference_order")?,
                    finalized_at: row.try_get("finalized_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("Loaded {} finalized likes for event {}", records.len(), event_id);

        Ok(records)
    }

    async fn event_phase(&self, event_id: &str) -> Result<Option<EventPhase>, Self::Error> {
        let phase: Option<PgEventPhase> = sqlx::query_scalar("SELECT phase FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(phase.map(EventPhase::from))
    }

    /// Writers of the same event are serialized with a transaction-scoped
    /// advisory lock, so the claim check and the insert see the same rows.
    /// A pair counts as already stored only when both artwork ids match; a
    /// `pair_key` collision with different artworks fails the insert.
    async fn upsert_match(&self, new_match: &NewMatch) -> Result<UpsertOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&new_match.event_id)
            .execute(&mut *tx)
            .await?;

        let artworks = vec![new_match.artwork1_id.clone(), new_match.artwork2_id.clone()];
        let existing = sqlx::query(
            r#"
            SELECT id, artwork1_id, artwork2_id
            FROM matches
            WHERE event_id = $1
              AND (artwork1_id = ANY($2) OR artwork2_id = ANY($2))
            ORDER BY created_at, id
            "#,
        )
        .bind(&new_match.event_id)
        .bind(&artworks)
        .fetch_all(&mut *tx)
        .await?;

        let existing = existing
            .iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("id")?,
                    row.try_get::<String, _>("artwork1_id")?,
                    row.try_get::<String, _>("artwork2_id")?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let same_pair = existing.iter().find(|(_, stored1, stored2)| {
            (*stored1 == new_match.artwork1_id && *stored2 == new_match.artwork2_id)
                || (*stored1 == new_match.artwork2_id && *stored2 == new_match.artwork1_id)
        });
        if let Some((match_id, _, _)) = same_pair {
            tx.commit().await?;
            return Ok(UpsertOutcome::Unchanged {
                match_id: match_id.clone(),
            });
        }

        if let Some((match_id, stored1, stored2)) = existing.first() {
            let artwork_id = artworks
                .iter()
                .find(|id| *id == stored1 || *id == stored2)
                .cloned()
                .unwrap_or_else(|| new_match.artwork1_id.clone());
            tx.commit().await?;
            return Ok(UpsertOutcome::Conflict {
                artwork_id,
                existing_match_id: match_id.clone(),
            });
        }

        let match_id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO matches (id, event_id, artwork1_id, artwork2_id, pair_key, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(&match_id)
        .bind(&new_match.event_id)
        .bind(&new_match.artwork1_id)
        .bind(&new_match.artwork2_id)
        .bind(&new_match.pair_key)
        .bind(&new_match.status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Inserted match {} ({}) for event {}",
            match_id,
            new_match.pair_key,
            new_match.event_id
        );

        Ok(UpsertOutcome::Created { match_id })
    }

    async fn list_matches(&self, event_id: &str) -> Result<Vec<MatchRecord>, Self::Error> {
        let query = r#"
            SELECT id, event_id, artwork1_id, artwork2_id, pair_key, status, created_at
            FROM matches
            WHERE event_id = $1
            ORDER BY created_at, id
        "#;

        let rows = sqlx::query(query).bind(event_id).fetch_all(&self.pool).await?;

        let matches = rows
            .iter()
            .map(|row| {
                Ok(MatchRecord {
                    id: row.try_get("id")?,
                    event_id: row.try_get("event_id")?,
                    artwork1_id: row.try_get("artwork1_id")?,
                    artwork2_id: row.try_get("artwork2_id")?,
                    pair_key: row.try_get("pair_key")?,
                    status: row.try_get("status")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(matches)
    }

    async fn create_notification(
        &self,
        artist_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> Result<String, Self::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO notifications (id, artist_id, kind, message, read, created_at)
            VALUES ($1, $2, $3, $4, FALSE, NOW())
            "#,
        )
        .bind(&id)
        .bind(artist_id)
        .bind(PgNotificationKind::from(kind))
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, Self::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
