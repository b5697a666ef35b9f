pub mod detector;
pub mod ledger;

use std::sync::Arc;
use tokio::sync::Mutex;

pub use detector::{Actor, Match, MatchDetector, PairState, SwipeError, SwipeEvent, SwipeOutcome, SwipePlan};
pub use ledger::{Decision, InconsistentDecision, Recorded, SwipeLedger};

/// Detector shared by request handlers. Holding the lock across the
/// plan/persist/commit sequence makes each event one atomic read-modify-write.
pub type SharedDetector = Arc<Mutex<MatchDetector>>;
