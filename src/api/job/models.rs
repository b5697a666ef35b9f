use serde::Deserialize;
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::{ExperienceLevel, Job, JobLocation, SalaryRange};

/// Body of `POST /jobs`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub business_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub skills_needed: BTreeSet<String>,
    pub experience_required: ExperienceLevel,
    #[serde(flatten)]
    pub salary: SalaryRange,
    #[serde(flatten)]
    pub location: JobLocation,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateJobRequest {
    /// Applicant, match and rejection lists always start empty
    pub fn into_job(self, id: Uuid) -> Job {
        Job {
            id,
            business_id: self.business_id,
            title: self.title,
            description: self.description,
            industry: self.industry,
            tags: self.tags,
            skills_needed: self.skills_needed,
            experience_required: self.experience_required,
            salary: self.salary,
            location: self.location,
            benefits: self.benefits,
            is_active: self.is_active,
            applicants: Vec::new(),
            matches: BTreeSet::new(),
            rejected: Default::default(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Validate for CreateJobRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.clone().into_job(Uuid::nil()).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(salary_min: f64) -> CreateJobRequest {
        serde_json::from_value(json!({
            "business_id": Uuid::new_v4(),
            "title": "Line cook",
            "experience_required": "Intermediate",
            "salary_min": salary_min,
            "salary_max": 70.0,
            "salary_unit": "hour",
            "is_remote": true
        }))
        .unwrap()
    }

    #[test]
    fn remote_request_builds_remote_job() {
        let job = request(50.0).into_job(Uuid::new_v4());
        assert_eq!(job.location, JobLocation::Remote);
        assert!(job.is_active);
        assert!(job.applicants.is_empty());
    }

    #[test]
    fn inverted_salary_range_fails_validation() {
        assert!(request(50.0).validate().is_ok());
        assert!(request(90.0).validate().is_err());
    }
}
