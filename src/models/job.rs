use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::common::{check_coordinates, ExperienceLevel, SalaryRange};

/// Where a job is performed. Remote jobs carry no coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "LocationFields", into = "LocationFields")]
pub enum JobLocation {
    Remote,
    OnSite {
        lat: f64,
        lng: f64,
        address: Option<String>,
    },
}

/// Persisted shape of [`JobLocation`]
#[derive(Debug, Clone, Deserialize, Serialize)]
struct LocationFields {
    #[serde(default)]
    location_lat: Option<f64>,
    #[serde(default)]
    location_lng: Option<f64>,
    #[serde(default)]
    location_address: Option<String>,
    #[serde(default)]
    is_remote: bool,
}

impl TryFrom<LocationFields> for JobLocation {
    type Error = String;

    fn try_from(fields: LocationFields) -> Result<Self, Self::Error> {
        match (fields.is_remote, fields.location_lat, fields.location_lng) {
            (true, None, None) => Ok(JobLocation::Remote),
            (true, _, _) => Err("remote jobs must not carry coordinates".to_string()),
            (false, Some(lat), Some(lng)) => Ok(JobLocation::OnSite {
                lat,
                lng,
                address: fields.location_address,
            }),
            (false, _, _) => Err("on-site jobs need both location_lat and location_lng".to_string()),
        }
    }
}

impl From<JobLocation> for LocationFields {
    fn from(location: JobLocation) -> Self {
        match location {
            JobLocation::Remote => LocationFields {
                location_lat: None,
                location_lng: None,
                location_address: Some("Remote".to_string()),
                is_remote: true,
            },
            JobLocation::OnSite { lat, lng, address } => LocationFields {
                location_lat: Some(lat),
                location_lng: Some(lng),
                location_address: address,
                is_remote: false,
            },
        }
    }
}

fn default_active() -> bool {
    true
}

/// A posting owned by exactly one business
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_job"))]
pub struct Job {
    pub id: Uuid,
    pub business_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
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
    #[serde(default)]
    pub applicants: Vec<Uuid>,
    #[serde(default)]
    pub matches: BTreeSet<Uuid>,
    #[serde(default)]
    pub rejected: BTreeMap<Uuid, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_job(job: &Job) -> Result<(), ValidationError> {
    job.salary.check()?;
    match job.location {
        JobLocation::OnSite { lat, lng, .. } => check_coordinates(lat, lng),
        JobLocation::Remote => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::SalaryUnit;
    use serde_json::json;

    pub(crate) fn job(id: Uuid, business_id: Uuid) -> Job {
        Job {
            id,
            business_id,
            title: "Barista".to_string(),
            description: "Morning shifts".to_string(),
            industry: Some("Hospitality".to_string()),
            tags: ["Food Service".to_string()].into_iter().collect(),
            skills_needed: ["Cash Handling".to_string()].into_iter().collect(),
            experience_required: ExperienceLevel::EntryLevel,
            salary: SalaryRange {
                salary_min: 40.0,
                salary_max: 55.0,
                salary_unit: SalaryUnit::Hour,
            },
            location: JobLocation::OnSite {
                lat: 31.25,
                lng: 34.79,
                address: Some("1 Main St".to_string()),
            },
            benefits: Vec::new(),
            is_active: true,
            applicants: Vec::new(),
            matches: BTreeSet::new(),
            rejected: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn remote_job_persists_null_coordinates() {
        let mut remote = job(Uuid::new_v4(), Uuid::new_v4());
        remote.location = JobLocation::Remote;

        let doc = serde_json::to_value(&remote).unwrap();

        assert_eq!(doc["is_remote"], json!(true));
        assert_eq!(doc["location_lat"], json!(null));
        assert_eq!(doc["location_lng"], json!(null));

        let back: Job = serde_json::from_value(doc).unwrap();
        assert_eq!(back.location, JobLocation::Remote);
    }

    #[test]
    fn remote_job_with_coordinates_is_rejected() {
        let mut doc = serde_json::to_value(job(Uuid::new_v4(), Uuid::new_v4())).unwrap();
        doc["is_remote"] = json!(true);

        assert!(serde_json::from_value::<Job>(doc).is_err());
    }

    #[test]
    fn on_site_job_round_trips_location() {
        let original = job(Uuid::new_v4(), Uuid::new_v4());
        let doc = serde_json::to_value(&original).unwrap();
        assert_eq!(doc["location_address"], json!("1 Main St"));

        let back: Job = serde_json::from_value(doc).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn job_validation_checks_salary_and_coordinates() {
        let mut bad_salary = job(Uuid::new_v4(), Uuid::new_v4());
        bad_salary.salary.salary_min = 60.0;
        assert!(bad_salary.validate().is_err());

        let mut bad_location = job(Uuid::new_v4(), Uuid::new_v4());
        bad_location.location = JobLocation::OnSite {
            lat: 10.0,
            lng: 200.0,
            address: None,
        };
        assert!(bad_location.validate().is_err());

        assert!(job(Uuid::new_v4(), Uuid::new_v4()).validate().is_ok());
    }
}
