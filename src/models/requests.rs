use serde::{Deserialize, Serialize};
use validator::Validate;

/// Path parameters of the event-scoped routes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventPath {
    #[validate(length(min = 1, max = 128))]
    pub event_id: String,
}

/// Request to calculate the matches of an event
///
/// The body is optional; an empty body uses the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CalculateMatchesRequest {
    /// Override `matching.notify_on_create` for this run
    #[serde(default)]
    pub notify: Option<bool>,
}
