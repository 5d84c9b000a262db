use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::core::{MatchRun, PersistStatus};
use crate::models::{MatchPair, NotificationKind};
use crate::services::MatchStore;

/// Errors that can occur when delivering a match webhook
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Webhook returned error status: {0}")]
    WebhookStatus(StatusCode),
}

/// Body POSTed to the match webhook for each newly created match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWebhookPayload {
    pub event_id: String,
    pub match_id: String,
    pub artwork1_id: String,
    pub artwork2_id: String,
    pub artist_ids: Vec<String>,
}

/// Outcome of dispatching notifications for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub notifications_created: usize,
    pub webhooks_sent: usize,
    pub warnings: Vec<String>,
}

/// Hands newly created matches to the notification pipeline
///
/// Every created match yields one `MATCH` notification row per owning
/// artist. When a webhook is configured, the match is also POSTed there so
/// the mail service can render and send the emails.
pub struct MatchNotifier {
    client: Client,
    webhook_url: Option<String>,
    api_key: Option<String>,
}

impl MatchNotifier {
    /// Create a notifier; `webhook_url = None` stores notification rows only
    pub fn new(
        webhook_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            webhook_url,
            api_key,
        })
    }

    pub fn has_webhook(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Deliver one match to the webhook
    pub async fn post_webhook(&self, payload: &MatchWebhookPayload) -> Result<bool, NotifierError> {
        let Some(url) = &self.webhook_url else {
            return Ok(false);
        };

        let mut request = self.client.post(url).json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifierError::WebhookStatus(response.status()));
        }

        tracing::debug!("Delivered match {} to webhook", payload.match_id);
        Ok(true)
    }

    /// Notify both artists of every match created by `run`.
    ///
    /// Failures never propagate; each one becomes a warning in the summary.
    pub async fn notify_created<S: MatchStore>(&self, store: &S, run: &MatchRun) -> NotificationSummary {
        let mut summary = NotificationSummary::default();

        for outcome in &run.report.outcomes {
            let PersistStatus::Created { match_id } = &outcome.status else {
                continue;
            };
            let pair = &outcome.pair;

            for (artist_id, own, other) in [
                (&pair.artist1_id, &pair.artwork1_id, &pair.artwork2_id),
                (&pair.artist2_id, &pair.artwork2_id, &pair.artwork1_id),
            ] {
                let message = match_message(&run.event_id, own, other);
                match store
                    .create_notification(artist_id, NotificationKind::Match, &message)
                    .await
                {
                    Ok(_) => summary.notifications_created += 1,
                    Err(e) => {
                        tracing::warn!("Failed to store notification for {}: {}", artist_id, e);
                        summary
                            .warnings
                            .push(format!("notification for artist {} failed: {}", artist_id, e));
                    }
                }
            }

            let payload = webhook_payload(&run.event_id, match_id, pair);
            match self.post_webhook(&payload).await {
                Ok(true) => summary.webhooks_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to deliver match {} to webhook: {}", match_id, e);
                    summary
                        .warnings
                        .push(format!("webhook for match {} failed: {}", match_id, e));
                }
            }
        }

        summary
    }
}

fn match_message(event_id: &str, own_artwork: &str, other_artwork: &str) -> String {
    format!(
        "Your artwork {} was matched with artwork {} in event {}",
        own_artwork, other_artwork, event_id
    )
}

fn webhook_payload(event_id: &str, match_id: &str, pair: &MatchPair) -> MatchWebhookPayload {
    MatchWebhookPayload {
        event_id: event_id.to_string(),
        match_id: match_id.to_string(),
        artwork1_id: pair.artwork1_id.clone(),
        artwork2_id: pair.artwork2_id.clone(),
        artist_ids: vec![pair.artist1_id.clone(), pair.artist2_id.clone()],
    }
}
