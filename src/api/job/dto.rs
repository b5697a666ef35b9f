use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Job;

/// Response for single job operations
#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: Job,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: Uuid,
}

/// Query of `GET /jobs`
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub business_id: Option<Uuid>,
    pub active: Option<bool>,
}
