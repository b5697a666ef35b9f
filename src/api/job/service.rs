use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::ListJobsQuery;
use super::models::CreateJobRequest;
use crate::api::patch;
use crate::api::records;
use crate::db::{DocPath, SharedStore, WriteOp, JOBS};
use crate::error::ServiceError;
use crate::ids::new_id;
use crate::matching::SharedDetector;
use crate::models::{Job, Role};

/// Fields owned by the server or the match detector
const PROTECTED_FIELDS: &[&str] = &["id", "applicants", "matches", "rejected", "created_at", "updated_at"];

/// Job service containing business logic
pub struct JobService {
    store: SharedStore,
    detector: SharedDetector,
}

impl JobService {
    pub fn new(store: SharedStore, detector: SharedDetector) -> Self {
        Self { store, detector }
    }

    pub async fn list(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ServiceError> {
        let jobs: Vec<Job> = records::list(self.store.as_ref(), JOBS).await?;
        Ok(jobs
            .into_iter()
            .filter(|job| query.business_id.map_or(true, |b| job.business_id == b))
            .filter(|job| query.active.map_or(true, |a| job.is_active == a))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Job, ServiceError> {
        records::fetch_job(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Create a job for an existing business
    ///
    /// # Business Logic
    /// - The owner must exist and have the Business role
    /// - Nothing is written when the owner check fails
    /// - The job is registered with the match detector once persisted
    pub async fn create(&self, request: CreateJobRequest) -> Result<Job, ServiceError> {
        info!("Service: Creating job title={} business={}", request.title, request.business_id);

        let owner = records::fetch_user(self.store.as_ref(), request.business_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Referential(format!("Business {} does not exist", request.business_id))
            })?;
        if owner.role() != Role::Business {
            return Err(ServiceError::Referential(format!(
                "User {} is not a business",
                owner.id
            )));
        }

        let mut detector = self.detector.lock().await;
        let job = request.into_job(new_id());
        let op = WriteOp::set(DocPath::job(job.id), &job)?
            .with_server_timestamp("created_at")
            .with_server_timestamp("updated_at");
        self.store.commit(&[op]).await?;

        if !detector.is_business(owner.id) {
            detector.load_user(&owner, None);
        }
        detector.load_job(&job)?;
        drop(detector);

        info!("Service: Job created successfully with id={}", job.id);
        self.get(job.id).await
    }

    /// Merge `changes` into the stored job. Ownership cannot move to another
    /// business; repeating the current owner is accepted.
    pub async fn update(&self, id: Uuid, mut changes: Map<String, Value>) -> Result<Job, ServiceError> {
        let existing = records::fetch::<Job>(self.store.as_ref(), &DocPath::job(id))
            .await?
            .ok_or_else(|| not_found(id))?;

        if let Some(owner) = changes.remove("business_id") {
            let owner: Uuid = serde_json::from_value(owner)
                .map_err(|e| ServiceError::Validation(format!("Invalid business_id: {}", e)))?;
            if owner != existing.record.business_id {
                warn!("Service: Refusing to reassign job {} to {}", id, owner);
                return Err(ServiceError::Validation(
                    "Job ownership cannot be changed".to_string(),
                ));
            }
        }
        let changes = patch::sanitize(changes, PROTECTED_FIELDS)?;

        let merged: Job = patch::preview(&existing.raw, &changes)?;
        merged.validate()?;
        let fields = patch::changed_fields(&existing.raw, &changes, &merged, PROTECTED_FIELDS)?;

        info!("Service: Updating job id={} fields={:?}", id, fields.keys().collect::<Vec<_>>());
        let op = WriteOp::merge(DocPath::job(id), fields).with_server_timestamp("updated_at");
        self.store.commit(&[op]).await?;
        self.get(id).await
    }

    /// Hard delete. Decisions and matches already recorded are kept, but the
    /// job accepts no further swipes.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut detector = self.detector.lock().await;
        if !self.store.delete(&DocPath::job(id)).await? {
            return Err(not_found(id));
        }
        detector.remove_job(id);

        info!("Service: Job deleted id={}", id);
        Ok(())
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Job with id {}", id))
}
