use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::Matcher;
use crate::models::{
    CalculateMatchesRequest, CalculateMatchesResponse, ErrorResponse, EventPath, HealthResponse,
    ListMatchesResponse,
};
use crate::services::{CacheKey, CacheManager, EventLocks, MatchNotifier, MatchStore};

/// Application state shared across all handlers
pub struct AppState<S> {
    pub matcher: Arc<Matcher<S>>,
    pub cache: Arc<CacheManager>,
    pub notifier: Arc<MatchNotifier>,
    pub event_locks: Arc<EventLocks>,
    pub matching: MatchingSettings,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            cache: Arc::clone(&self.cache),
            notifier: Arc::clone(&self.notifier),
            event_locks: Arc::clone(&self.event_locks),
            matching: self.matching.clone(),
        }
    }
}

/// Configure all match-related routes
pub fn configure<S: MatchStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check::<S>))
        .route("/events/{event_id}/matches", web::get().to(list_matches::<S>))
        .route(
            "/events/{event_id}/matches/calculate",
            web::post().to(calculate_matches::<S>),
        );
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check<S: MatchStore>(state: web::Data<AppState<S>>) -> impl Responder {
    let db_healthy = state.matcher.store().health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Calculate matches endpoint
///
/// POST /api/v1/events/{event_id}/matches/calculate
///
/// Request body (optional):
/// ```json
/// { "notify": true }
/// ```
///
/// Partial persistence failures still answer 200; they are listed under
/// `failures` and summarized in `warnings`.
async fn calculate_matches<S: MatchStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<EventPath>,
    body: Option<web::Json<CalculateMatchesRequest>>,
) -> impl Responder {
    if let Err(errors) = path.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }
    let event_id = path.event_id.as_str();
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    let Some(_guard) = state.event_locks.try_acquire(event_id) else {
        tracing::info!("Rejecting calculation for {}: run already in progress", event_id);
        return error_response(
            StatusCode::CONFLICT,
            "Calculation in progress",
            format!("Matches for event {} are already being calculated", event_id),
        );
    };

    let store = state.matcher.store();

    // Unknown events fall through and produce an empty result
    match store.event_phase(event_id).await {
        Ok(Some(phase)) if !state.matching.allowed_phases.contains(&phase) => {
            return error_response(
                StatusCode::CONFLICT,
                "Event phase does not allow matching",
                format!("Event {} is in phase {}", event_id, phase),
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to fetch phase of event {}: {}", event_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch event",
                e.to_string(),
            );
        }
    }

    let run = match state.matcher.calculate_matches(event_id).await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("Match calculation failed for {}: {}", event_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to calculate matches",
                e.to_string(),
            );
        }
    };

    // Bump before invalidating so concurrent listings see the run
    state.event_locks.mark_finished();
    if let Err(e) = state.cache.delete(&CacheKey::event_matches(event_id)).await {
        tracing::warn!("Failed to invalidate cache: {}", e);
    }

    let mut warnings = Vec::new();
    if request.notify.unwrap_or(state.matching.notify_on_create) {
        let summary = state.notifier.notify_created(store, &run).await;
        tracing::debug!(
            "Notifications for {}: {} stored, {} webhooks",
            event_id,
            summary.notifications_created,
            summary.webhooks_sent
        );
        warnings.extend(summary.warnings);
    }

    let response = CalculateMatchesResponse::from_run(run, warnings);

    if !response.warnings.is_empty() {
        tracing::warn!(
            "Calculation for {} finished with warnings: {:?}",
            event_id,
            response.warnings
        );
    }

    HttpResponse::Ok().json(response)
}

/// List persisted matches of an event
///
/// GET /api/v1/events/{event_id}/matches
async fn list_matches<S: MatchStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<EventPath>,
) -> impl Responder {
    if let Err(errors) = path.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }
    let event_id = path.event_id.as_str();
    let cache_key = CacheKey::event_matches(event_id);

    if let Ok(cached) = state.cache.get::<ListMatchesResponse>(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let runs_before = state.event_locks.finished_runs();
    let matches = match state.matcher.store().list_matches(event_id).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!("Failed to list matches for {}: {}", event_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list matches",
                e.to_string(),
            );
        }
    };

    let response = ListMatchesResponse {
        event_id: event_id.to_string(),
        total: matches.len(),
        matches,
    };

    cache_listing(&state.cache, &state.event_locks, &cache_key, &response, runs_before).await;

    HttpResponse::Ok().json(response)
}

/// Cache a listing read while `runs_before` runs had finished.
///
/// A run finishing between the read and the write may already have
/// invalidated the key, so the entry is dropped again when the counter moved.
async fn cache_listing(
    cache: &CacheManager,
    locks: &EventLocks,
    cache_key: &str,
    response: &ListMatchesResponse,
    runs_before: u64,
) {
    if let Err(e) = cache.set(cache_key, response).await {
        tracing::warn!("Failed to cache {}: {}", cache_key, e);
        return;
    }

    if locks.finished_runs() != runs_before {
        tracing::debug!("Dropping possibly stale listing {}", cache_key);
        if let Err(e) = cache.delete(cache_key).await {
            tracing::warn!("Failed to invalidate cache: {}", e);
        }
    }
}
