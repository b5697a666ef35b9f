use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::{Contact, Profile, User, WorkerProfile};

/// Body of `POST /workers`
#[derive(Debug, Deserialize)]
pub struct CreateWorkerRequest {
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(flatten)]
    pub profile: WorkerProfile,
}

impl Validate for CreateWorkerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.contact.validate()?;
        self.profile.validate()
    }
}

impl CreateWorkerRequest {
    /// Matches are only ever written by the match detector
    pub fn into_user(self, id: Uuid) -> User {
        let mut profile = self.profile;
        profile.matched_jobs.clear();
        User {
            id,
            contact: self.contact,
            profile: Profile::Worker(profile),
            created_at: None,
            last_updated_at: None,
        }
    }
}

/// Response for single worker operations
#[derive(Serialize)]
pub struct WorkerResponse {
    pub message: String,
    pub worker: User,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: Uuid,
}
