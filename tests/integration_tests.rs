// Integration tests for Artswap Matcher

use actix_web::{http::StatusCode, test, web, App};
use artswap_matcher::config::MatchingSettings;
use artswap_matcher::core::{MatchError, Matcher, PersistStatus};
use artswap_matcher::models::{pair_key, EventPhase, MatchRecord, NotificationKind, Vote};
use artswap_matcher::routes::{self, matches::AppState};
use artswap_matcher::services::{CacheManager, EventLocks, InMemoryStore, MatchNotifier};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

const EVENT: &str = "event-1";

/// Register artists and their artworks; artwork `art-x` belongs to `x`
fn seed_artists(store: &InMemoryStore, names: &[&str]) {
    for name in names {
        store.add_artist(name).unwrap();
        store.add_artwork(&format!("art-{}", name), name).unwrap();
    }
}

fn like(store: &InMemoryStore, voter: &str, owner: &str, order: Option<i32>) {
    store
        .add_vote(Vote::liked(voter, &format!("art-{}", owner), EVENT, order))
        .unwrap();
}

fn mutual_pair_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_event(EVENT, EventPhase::Closed).unwrap();
    seed_artists(&store, &["a", "b"]);
    like(&store, "a", "b", Some(1));
    like(&store, "b", "a", Some(1));
    store
}

#[tokio::test]
async fn test_mutual_like_creates_completed_match() {
    let store = mutual_pair_store();
    let matcher = Matcher::new(store.clone());

    let run = matcher.calculate_matches(EVENT).await.unwrap();

    assert_eq!(run.matches.len(), 1);
    assert_eq!(run.matches[0].combined_score.total(), Some(2));
    assert_eq!(run.report.created(), 1);

    let stored = store.matches().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, "completed");
    assert_eq!(stored[0].pair_key, pair_key("art-a", "art-b"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = mutual_pair_store();
    let matcher = Matcher::new(store.clone());

    let first = matcher.calculate_matches(EVENT).await.unwrap();
    let second = matcher.calculate_matches(EVENT).await.unwrap();

    assert_eq!(first.matches, second.matches);
    assert_eq!(second.report.created(), 0);
    assert_eq!(second.report.unchanged(), 1);
    assert_eq!(store.matches().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_event_yields_empty_result() {
    let store = mutual_pair_store();
    let matcher = Matcher::new(store.clone());

    let run = matcher.calculate_matches("no-such-event").await.unwrap();

    assert!(run.matches.is_empty());
    assert!(run.report.outcomes.is_empty());
    assert!(store.matches().unwrap().is_empty());
}

#[tokio::test]
async fn test_unfinalized_votes_create_nothing() {
    let store = InMemoryStore::new();
    seed_artists(&store, &["a", "b"]);
    store
        .add_vote(Vote::liked("a", "art-b", EVENT, Some(1)).unfinalized())
        .unwrap();
    store
        .add_vote(Vote::liked("b", "art-a", EVENT, Some(1)).unfinalized())
        .unwrap();

    let run = Matcher::new(store.clone()).calculate_matches(EVENT).await.unwrap();

    assert!(run.matches.is_empty());
    assert!(store.matches().unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_does_not_stop_other_pairs() {
    let store = InMemoryStore::new();
    seed_artists(&store, &["a", "b", "c", "d"]);
    like(&store, "a", "b", Some(1));
    like(&store, "b", "a", Some(1));
    like(&store, "c", "d", Some(1));
    like(&store, "d", "c", Some(2));
    store.fail_upserts_for(&pair_key("art-a", "art-b")).unwrap();

    let run = Matcher::new(store.clone()).calculate_matches(EVENT).await.unwrap();

    assert_eq!(run.matches.len(), 2);
    assert_eq!(run.report.failed(), 1);
    assert_eq!(run.report.created(), 1);
    assert!(!run.report.is_complete());

    let stored = store.matches().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].pair_key, pair_key("art-c", "art-d"));
}

#[tokio::test]
async fn test_ids_containing_separator_are_stored_separately() {
    let store = InMemoryStore::new();
    for (artist, artwork) in [("p1", "a"), ("p2", "b:c"), ("p3", "a:b"), ("p4", "c")] {
        store.add_artist(artist).unwrap();
        store.add_artwork(artwork, artist).unwrap();
    }
    for (voter, artwork) in [("p1", "b:c"), ("p2", "a"), ("p3", "c"), ("p4", "a:b")] {
        store
            .add_vote(Vote::liked(voter, artwork, EVENT, Some(1)))
            .unwrap();
    }

    let run = Matcher::new(store.clone()).calculate_matches(EVENT).await.unwrap();

    assert_eq!(run.matches.len(), 2);
    assert_eq!(run.report.created(), 2);
    assert_eq!(run.report.unchanged(), 0);

    let stored = store.matches().unwrap();
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].pair_key, stored[1].pair_key);
}

#[tokio::test]
async fn test_stored_match_blocks_conflicting_pair() {
    let store = mutual_pair_store();
    store
        .insert_match(MatchRecord {
            id: "earlier".to_string(),
            event_id: EVENT.to_string(),
            artwork1_id: "art-b".to_string(),
            artwork2_id: "art-z".to_string(),
            pair_key: pair_key("art-b", "art-z"),
            status: "completed".to_string(),
            created_at: Utc::now(),
        })
        .unwrap();

    let run = Matcher::new(store.clone()).calculate_matches(EVENT).await.unwrap();

    assert_eq!(run.report.conflicts(), 1);
    assert_eq!(
        run.report.outcomes[0].status,
        PersistStatus::Conflict {
            artwork_id: "art-b".to_string(),
            existing_match_id: "earlier".to_string(),
        }
    );
    assert_eq!(store.matches().unwrap().len(), 1);
}

#[tokio::test]
async fn test_load_failure_is_fatal() {
    let store = mutual_pair_store();
    store.fail_loads().unwrap();

    let err = Matcher::new(store).calculate_matches(EVENT).await.unwrap_err();
    assert!(matches!(err, MatchError::LoadVotes { ref event_id, .. } if event_id == EVENT));
}

#[tokio::test]
async fn test_votes_on_missing_artworks_are_reported() {
    let store = mutual_pair_store();
    store
        .add_vote(Vote::liked("a", "art-deleted", EVENT, Some(2)))
        .unwrap();

    let run = Matcher::new(store).calculate_matches(EVENT).await.unwrap();

    assert_eq!(run.matches.len(), 1);
    assert_eq!(run.skipped_votes.len(), 1);
}

// ─── HTTP routes ─────────────────────────────────────────────────────────────

fn app_state(store: InMemoryStore, notify_on_create: bool) -> AppState<InMemoryStore> {
    AppState {
        matcher: Arc::new(Matcher::new(store)),
        cache: Arc::new(CacheManager::in_memory(100, 60)),
        notifier: Arc::new(MatchNotifier::new(None, None, Duration::from_secs(1)).unwrap()),
        event_locks: Arc::new(EventLocks::new()),
        matching: MatchingSettings {
            allowed_phases: vec![EventPhase::Closed],
            notify_on_create,
        },
    }
}

#[actix_web::test]
async fn test_calculate_endpoint_creates_and_notifies() {
    let store = mutual_pair_store();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(store.clone(), true)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events/event-1/matches/calculate")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["eventId"], EVENT);
    assert_eq!(body["created"], 1);
    assert_eq!(body["matches"][0]["artwork1Id"], "art-a");
    assert_eq!(body["matches"][0]["combinedScore"]["rankedTotal"], 2);
    assert!(body["warnings"].as_array().unwrap().is_empty());

    let notifications = store.notifications().unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n.kind == NotificationKind::Match));
}

#[actix_web::test]
async fn test_calculate_endpoint_can_skip_notifications() {
    let store = mutual_pair_store();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(store.clone(), true)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events/event-1/matches/calculate")
        .set_json(serde_json::json!({ "notify": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(store.notifications().unwrap().is_empty());
    assert_eq!(store.matches().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_calculate_endpoint_rejects_open_event() {
    let store = mutual_pair_store();
    store.set_phase(EVENT, EventPhase::Voting).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(store.clone(), false)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events/event-1/matches/calculate")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(store.matches().unwrap().is_empty());
}

#[actix_web::test]
async fn test_calculate_endpoint_reports_partial_failure_as_warning() {
    let store = mutual_pair_store();
    store.fail_upserts_for(&pair_key("art-a", "art-b")).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(store.clone(), false)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events/event-1/matches/calculate")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["created"], 0);
    assert_eq!(body["failures"][0]["status"], "failed");
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_list_endpoint_reflects_latest_calculation() {
    let store = mutual_pair_store();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(store.clone(), false)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    // Prime the cache with the empty listing
    let req = test::TestRequest::get()
        .uri("/api/v1/events/event-1/matches")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);

    let req = test::TestRequest::post()
        .uri("/api/v1/events/event-1/matches/calculate")
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events/event-1/matches")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["matches"][0]["status"], "completed");
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(InMemoryStore::new(), false)))
            .configure(routes::configure_routes::<InMemoryStore>),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}
