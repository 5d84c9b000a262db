// Core algorithm exports
pub mod detector;
pub mod loader;
pub mod matcher;
pub mod persister;
pub mod preference;
pub mod resolver;

pub use detector::detect_mutual_likes;
pub use loader::{shape_votes, LoadedVotes};
pub use matcher::{compute_matches, MatchError, MatchPlan, MatchRun, Matcher};
pub use persister::{persist_matches, PairOutcome, PersistReport, PersistStatus};
pub use preference::{CombinedScore, PreferenceRank};
pub use resolver::{rank_candidates, resolve_conflicts, Resolution};
