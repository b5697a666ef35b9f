use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::matching::{Decision, Match, PairState, Recorded, SwipeEvent};

/// Body of `POST /swipes/workers/{worker_id}`
#[derive(Debug, Deserialize, Validate)]
pub struct WorkerSwipeRequest {
    pub job_id: Uuid,
    pub decision: Decision,
}

/// Body of `POST /swipes/businesses/{business_id}`
#[derive(Debug, Deserialize, Validate)]
pub struct BusinessSwipeRequest {
    pub worker_id: Uuid,
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub event: SwipeEvent,
    pub recorded: Recorded,
    pub matches: Vec<Match>,
    /// Pair state after the event; only set for worker swipes, which name a single job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PairState>,
}

#[derive(Debug, Serialize)]
pub struct PairResponse {
    pub worker_id: Uuid,
    pub job_id: Uuid,
    pub state: PairState,
}
