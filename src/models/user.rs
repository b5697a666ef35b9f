use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::common::{check_coordinates, check_salary_bounds, ExperienceLevel, Role, SalaryRange, SalaryUnit};

/// Contact and account fields shared by both roles
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct Contact {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[serde(rename = "firstName")]
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[serde(rename = "lastName")]
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "profileComplete", default)]
    pub profile_complete: bool,
}

/// A marketplace account, discriminated by `role`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "role")]
pub enum Profile {
    Worker(WorkerProfile),
    Business(BusinessProfile),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_worker_profile"))]
pub struct WorkerProfile {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub preferred_tags: BTreeSet<String>,
    #[serde(flatten)]
    pub salary: SalaryRange,
    pub location_lat: f64,
    pub location_lng: f64,
    #[serde(default)]
    pub job_search_radius: Option<u32>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default)]
    pub matched_jobs: BTreeSet<Uuid>,
}

fn validate_worker_profile(profile: &WorkerProfile) -> Result<(), ValidationError> {
    profile.salary.check()?;
    check_coordinates(profile.location_lat, profile.location_lng)
}

/// Job fields a business keeps on its profile for quick posting
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobTemplate {
    pub job_title: String,
    pub job_description: String,
    pub job_experience_required: ExperienceLevel,
    pub job_salary_min: f64,
    pub job_salary_max: f64,
    pub job_salary_unit: SalaryUnit,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_business_profile"))]
pub struct BusinessProfile {
    #[validate(length(min = 1, message = "Business name is required"))]
    pub business_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub job_template: JobTemplate,
    #[serde(default)]
    pub liked_workers: Vec<Uuid>,
    #[serde(default)]
    pub disliked_workers: BTreeMap<Uuid, bool>,
    #[serde(default)]
    pub matched_workers: BTreeSet<Uuid>,
}

fn validate_business_profile(profile: &BusinessProfile) -> Result<(), ValidationError> {
    check_salary_bounds(
        profile.job_template.job_salary_min,
        profile.job_template.job_salary_max,
    )
}

impl User {
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Worker(_) => Role::Worker,
            Profile::Business(_) => Role::Business,
        }
    }

    pub fn as_worker(&self) -> Option<&WorkerProfile> {
        match &self.profile {
            Profile::Worker(worker) => Some(worker),
            Profile::Business(_) => None,
        }
    }

    pub fn as_business(&self) -> Option<&BusinessProfile> {
        match &self.profile {
            Profile::Business(business) => Some(business),
            Profile::Worker(_) => None,
        }
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.contact.validate()?;
        match &self.profile {
            Profile::Worker(worker) => worker.validate(),
            Profile::Business(business) => business.validate(),
        }
    }
}
