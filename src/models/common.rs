use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use validator::ValidationError;

/// Experience levels, ordered from least to most senior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry-level")]
    EntryLevel,
    Intermediate,
    Senior,
    Expert,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::EntryLevel,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Senior,
        ExperienceLevel::Expert,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryUnit {
    Hour,
    Month,
}

/// Salary bounds sharing one unit; `salary_min <= salary_max`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SalaryRange {
    pub salary_min: f64,
    pub salary_max: f64,
    pub salary_unit: SalaryUnit,
}

impl SalaryRange {
    pub fn check(&self) -> Result<(), ValidationError> {
        check_salary_bounds(self.salary_min, self.salary_max)
    }
}

pub fn check_salary_bounds(min: f64, max: f64) -> Result<(), ValidationError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(validation_error(
            "salary_range",
            "Salary bounds must be finite and non-negative".to_string(),
        ));
    }
    if min > max {
        return Err(validation_error(
            "salary_range",
            format!("salary_min ({}) must not exceed salary_max ({})", min, max),
        ));
    }
    Ok(())
}

pub fn check_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(validation_error(
            "latitude",
            format!("Latitude {} is outside [-90, 90]", lat),
        ));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(validation_error(
            "longitude",
            format!("Longitude {} is outside [-180, 180]", lng),
        ));
    }
    Ok(())
}

pub(crate) fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Which side of the marketplace an actor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Role {
    Worker,
    Business,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Worker => f.write_str("Worker"),
            Role::Business => f.write_str("Business"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_levels_are_ordered() {
        assert!(ExperienceLevel::EntryLevel < ExperienceLevel::Intermediate);
        assert!(ExperienceLevel::Intermediate < ExperienceLevel::Senior);
        assert!(ExperienceLevel::Senior < ExperienceLevel::Expert);
        assert_eq!(
            serde_json::to_string(&ExperienceLevel::EntryLevel).unwrap(),
            "\"Entry-level\""
        );
    }

    #[test]
    fn zero_width_salary_range_is_valid() {
        let range = SalaryRange {
            salary_min: 50.0,
            salary_max: 50.0,
            salary_unit: SalaryUnit::Hour,
        };
        assert!(range.check().is_ok());
    }

    #[test]
    fn inverted_salary_range_is_rejected() {
        let err = check_salary_bounds(60.0, 50.0).unwrap_err();
        assert_eq!(err.code, "salary_range");
    }

    #[test]
    fn coordinates_are_bounded() {
        assert!(check_coordinates(90.0, -180.0).is_ok());
        assert_eq!(check_coordinates(90.5, 0.0).unwrap_err().code, "latitude");
        assert_eq!(check_coordinates(0.0, 180.1).unwrap_err().code, "longitude");
    }
}
