use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::dto::CreateWorkerRequest;
use crate::api::patch;
use crate::api::records;
use crate::db::{DocPath, SharedStore, WriteOp, USERS};
use crate::error::ServiceError;
use crate::ids::new_id;
use crate::matching::ledger::WorkerSwipes;
use crate::matching::SharedDetector;
use crate::models::{Role, User};

/// Fields owned by the server or the match detector
const PROTECTED_FIELDS: &[&str] = &["id", "role", "matched_jobs", "created_at", "last_updated_at"];

/// Worker profile service
pub struct WorkerService {
    store: SharedStore,
    detector: SharedDetector,
}

impl WorkerService {
    pub fn new(store: SharedStore, detector: SharedDetector) -> Self {
        Self { store, detector }
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let users: Vec<User> = records::list(self.store.as_ref(), USERS).await?;
        Ok(users.into_iter().filter(|u| u.role() == Role::Worker).collect())
    }

    /// A user that exists but is a business is reported as not found
    pub async fn get(&self, id: Uuid) -> Result<User, ServiceError> {
        records::fetch_user(self.store.as_ref(), id)
            .await?
            .filter(|u| u.role() == Role::Worker)
            .ok_or_else(|| not_found(id))
    }

    /// Create a worker together with its empty swipe document
    pub async fn create(&self, request: CreateWorkerRequest) -> Result<User, ServiceError> {
        let id = new_id();
        let worker = request.into_user(id);
        info!("Service: Creating worker id={} username={}", id, worker.contact.username);

        let ops = [
            WriteOp::set(DocPath::user(id), &worker)?
                .with_server_timestamp("created_at")
                .with_server_timestamp("last_updated_at"),
            WriteOp::set(DocPath::swipes(id), &WorkerSwipes::default())?,
        ];
        self.store.commit(&ops).await?;
        self.detector.lock().await.register_worker(id);

        info!("Service: Worker created successfully with id={}", id);
        self.get(id).await
    }

    /// Merge `changes` into the stored profile. The merged profile must
    /// still validate; nothing is written otherwise.
    pub async fn update(&self, id: Uuid, changes: Map<String, Value>) -> Result<User, ServiceError> {
        let changes = patch::sanitize(changes, PROTECTED_FIELDS)?;
        let existing = records::fetch::<User>(self.store.as_ref(), &DocPath::user(id))
            .await?
            .filter(|l| l.record.role() == Role::Worker)
            .ok_or_else(|| not_found(id))?;

        let merged: User = patch::preview(&existing.raw, &changes)?;
        merged.validate()?;
        let fields = patch::changed_fields(&existing.raw, &changes, &merged, PROTECTED_FIELDS)?;

        info!("Service: Updating worker id={} fields={:?}", id, fields.keys().collect::<Vec<_>>());
        let op = WriteOp::merge(DocPath::user(id), fields).with_server_timestamp("last_updated_at");
        self.store.commit(&[op]).await?;
        self.get(id).await
    }

    /// Hard delete of the profile and its swipe document. Matches recorded
    /// on jobs and businesses are kept.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut detector = self.detector.lock().await;
        self.get(id).await?;

        self.store.delete(&DocPath::user(id)).await?;
        self.store.delete(&DocPath::swipes(id)).await?;
        detector.remove_user(id);

        info!("Service: Worker deleted id={}", id);
        Ok(())
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Worker with id {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::matching::MatchDetector;
    use crate::models::Profile;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn service() -> (WorkerService, SharedStore, SharedDetector) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let detector: SharedDetector = Arc::new(Mutex::new(MatchDetector::new()));
        (WorkerService::new(store.clone(), detector.clone()), store, detector)
    }

    fn request() -> CreateWorkerRequest {
        serde_json::from_value(json!({
            "email": "noa@example.com",
            "firstName": "Noa",
            "lastName": "Bar",
            "username": "noa",
            "experience_level": "Senior",
            "skills": ["Welding"],
            "salary_min": 60.0,
            "salary_max": 90.0,
            "salary_unit": "hour",
            "location_lat": 31.0,
            "location_lng": 35.0,
            "matched_jobs": [Uuid::new_v4()]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let (service, store, detector) = service();

        let worker = service.create(request()).await.unwrap();

        assert!(worker.created_at.is_some());
        assert!(worker.as_worker().unwrap().matched_jobs.is_empty());
        assert!(store.get(&DocPath::swipes(worker.id)).await.unwrap().is_some());
        assert!(detector.lock().await.is_worker(worker.id));
    }

    #[tokio::test]
    async fn update_rejects_merged_record_that_fails_validation() {
        let (service, _, _) = service();
        let worker = service.create(request()).await.unwrap();

        let changes = json!({"salary_min": 500.0}).as_object().cloned().unwrap();
        let err = service.update(worker.id, changes).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let unchanged = service.get(worker.id).await.unwrap();
        assert_eq!(unchanged.as_worker().unwrap().salary.salary_min, 60.0);
    }

    #[tokio::test]
    async fn update_merges_and_bumps_last_updated() {
        let (service, _, _) = service();
        let worker = service.create(request()).await.unwrap();

        let changes = json!({"headline": "Certified welder"}).as_object().cloned().unwrap();
        let updated = service.update(worker.id, changes).await.unwrap();

        let Profile::Worker(profile) = &updated.profile else {
            panic!("expected a worker");
        };
        assert_eq!(profile.headline.as_deref(), Some("Certified welder"));
        assert_eq!(updated.contact.username, "noa");
        assert!(updated.last_updated_at >= worker.last_updated_at);
    }

    #[tokio::test]
    async fn update_refuses_matched_jobs() {
        let (service, _, _) = service();
        let worker = service.create(request()).await.unwrap();

        let changes = json!({"matched_jobs": []}).as_object().cloned().unwrap();
        assert!(matches!(
            service.update(worker.id, changes).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_refuses_fields_outside_the_profile() {
        let (service, store, _) = service();
        let worker = service.create(request()).await.unwrap();

        let changes = json!({"anything": 1}).as_object().cloned().unwrap();
        let err = service.update(worker.id, changes).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("'anything'")));
        let raw = store.get(&DocPath::user(worker.id)).await.unwrap().unwrap();
        assert!(raw.get("anything").is_none());
    }

    #[tokio::test]
    async fn delete_removes_documents_and_second_delete_is_not_found() {
        let (service, store, detector) = service();
        let worker = service.create(request()).await.unwrap();

        service.delete(worker.id).await.unwrap();

        assert!(store.get(&DocPath::swipes(worker.id)).await.unwrap().is_none());
        assert!(!detector.lock().await.is_worker(worker.id));
        assert!(matches!(
            service.delete(worker.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
