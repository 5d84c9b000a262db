// Service exports
pub mod cache;
pub mod locks;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use locks::EventLocks;
pub use memory::{InMemoryStore, MemoryStoreError, StoredNotification};
pub use notifier::{MatchNotifier, MatchWebhookPayload, NotificationSummary, NotifierError};
pub use postgres::{PostgresClient, PostgresError};
pub use store::MatchStore;
