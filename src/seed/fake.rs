use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::models::{
    BusinessProfile, Contact, ExperienceLevel, Job, JobLocation, JobTemplate, Profile, SalaryRange, SalaryUnit,
    User, WorkerProfile,
};

const SKILLS: &[&str] = &[
    "Communication",
    "Customer Service",
    "Sales",
    "Problem Solving",
    "Python",
    "JavaScript",
    "React",
    "Node.js",
    "Data Entry",
    "Project Management",
    "Cooking",
    "Cleaning",
    "Driving",
    "Cash Handling",
];

const TAGS: &[&str] = &[
    "Retail",
    "Hospitality",
    "Technology",
    "Food Service",
    "Customer Support",
    "Office Admin",
    "Warehouse",
    "Construction",
    "Education",
    "Healthcare",
];

const INDUSTRIES: &[&str] = &[
    "Technology",
    "Retail",
    "Hospitality",
    "Healthcare",
    "Finance",
    "Education",
    "Construction",
    "Food & Beverage",
];

const AVAILABILITY: &[&str] = &[
    "Full-time",
    "Part-time",
    "Contract",
    "Internship",
    "Temporary",
    "Flexible Hours",
    "Remote",
    "On-Site",
    "Hybrid",
];

const BENEFITS: &[&str] = &[
    "Health Insurance",
    "Paid Time Off (PTO)",
    "Dental Insurance",
    "Vision Insurance",
    "401(k)",
    "Flexible Schedule",
    "Remote Work Options",
    "Paid Sick Leave",
    "Employee Discount",
];

const FIRST_NAMES: &[&str] = &[
    "Noa", "Daniel", "Maya", "Omer", "Tamar", "Yossi", "Lior", "Shira", "Amit", "Rina", "Eitan", "Dana",
];

const LAST_NAMES: &[&str] = &[
    "Cohen", "Levi", "Mizrahi", "Peretz", "Biton", "Dahan", "Avraham", "Friedman", "Katz", "Shapiro",
];

const COMPANY_WORDS: &[&str] = &[
    "Blue", "Harbor", "Summit", "Cedar", "Orbit", "Lantern", "Olive", "Granite", "Beacon", "Desert",
];

const COMPANY_SUFFIXES: &[&str] = &["Labs", "Group", "Logistics", "Kitchen", "Retail", "Works", "Studio"];

const JOB_TITLES: &[&str] = &[
    "Barista",
    "Line Cook",
    "Sales Associate",
    "Warehouse Operator",
    "Delivery Driver",
    "Front Desk Agent",
    "Junior Developer",
    "Office Administrator",
    "Support Specialist",
    "Site Supervisor",
    "Teaching Assistant",
    "Medical Receptionist",
];

const HEADLINES: &[&str] = &[
    "Reliable team player",
    "Fast learner with a customer-first attitude",
    "Detail-oriented and punctual",
    "Hands-on problem solver",
    "Looking for my next challenge",
];

const SENTENCES: &[&str] = &[
    "Comfortable working in fast-paced environments.",
    "Enjoys solving problems with a calm head.",
    "Has handled cash and inventory responsibly.",
    "Works well with small, close-knit teams.",
    "Available on short notice.",
    "Brings strong references from previous roles.",
    "Keen to grow into a leadership position.",
];

const STREETS: &[&str] = &["Herzl", "Rothschild", "Dizengoff", "Ben Yehuda", "Allenby", "Jabotinsky"];

const CITIES: &[&str] = &["Tel Aviv", "Haifa", "Jerusalem", "Beersheba", "Netanya", "Eilat"];

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&str]) -> String {
    list.choose(rng).copied().unwrap_or_default().to_string()
}

/// `lo..=hi` distinct entries of `list`
fn pick_many<R: Rng + ?Sized>(rng: &mut R, list: &[&str], lo: usize, hi: usize) -> Vec<String> {
    let k = rng.gen_range(lo..=hi.min(list.len()));
    list.choose_multiple(rng, k).map(|s| s.to_string()).collect()
}

fn paragraph<R: Rng + ?Sized>(rng: &mut R, sentences: usize) -> String {
    pick_many(rng, SENTENCES, sentences, sentences).join(" ")
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Coordinates inside a fixed regional bounding box
fn coordinates<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    (
        round_to(rng.gen_range(29.5..33.3), 6),
        round_to(rng.gen_range(34.2..35.9), 6),
    )
}

/// `min` drawn from `lo..=hi`, width from `width_lo..=width_hi`, both rounded to `step`
fn salary_bounds<R: Rng + ?Sized>(rng: &mut R, lo: u32, hi: u32, width_lo: u32, width_hi: u32, step: f64) -> (f64, f64) {
    let min = (f64::from(rng.gen_range(lo..=hi)) / step).round() * step;
    let width = (f64::from(rng.gen_range(width_lo..=width_hi)) / step).round() * step;
    (min, min + width)
}

fn salary_unit<R: Rng + ?Sized>(rng: &mut R) -> SalaryUnit {
    if rng.gen_bool(0.5) {
        SalaryUnit::Hour
    } else {
        SalaryUnit::Month
    }
}

fn experience<R: Rng + ?Sized>(rng: &mut R) -> ExperienceLevel {
    ExperienceLevel::ALL
        .choose(rng)
        .copied()
        .unwrap_or(ExperienceLevel::EntryLevel)
}

/// Contact details; `n` keeps email and username unique within a run
fn contact<R: Rng + ?Sized>(rng: &mut R, n: usize, profile_complete: f64) -> Contact {
    let first_name = pick(rng, FIRST_NAMES);
    let last_name = pick(rng, LAST_NAMES);
    let handle = format!("{}.{}{}", first_name.to_lowercase(), last_name.to_lowercase(), n);
    Contact {
        email: format!("{}@example.com", handle),
        username: handle.replace('.', "_"),
        phone: Some(format!(
            "05{}-{:03}-{:04}",
            rng.gen_range(0..10),
            rng.gen_range(0..1000),
            rng.gen_range(0..10_000)
        )),
        profile_complete: rng.gen_bool(profile_complete),
        first_name,
        last_name,
    }
}

pub fn worker<R: Rng + ?Sized>(rng: &mut R, id: Uuid, n: usize) -> User {
    let contact = contact(rng, n, 0.8);
    let (location_lat, location_lng) = coordinates(rng);
    let (salary_min, salary_max) = salary_bounds(rng, 50, 150, 10, 100, 10.0);

    User {
        id,
        contact,
        profile: Profile::Worker(WorkerProfile {
            headline: Some(pick(rng, HEADLINES)),
            summary: Some(paragraph(rng, 3)),
            experience_level: experience(rng),
            skills: pick_many(rng, SKILLS, 3, 8).into_iter().collect(),
            preferred_tags: pick_many(rng, TAGS, 1, 4).into_iter().collect(),
            salary: SalaryRange {
                salary_min,
                salary_max,
                salary_unit: salary_unit(rng),
            },
            location_lat,
            location_lng,
            job_search_radius: [10, 25, 50, 100].choose(rng).copied(),
            availability: pick_many(rng, AVAILABILITY, 1, 3),
            willing_to_relocate: rng.gen_bool(0.15),
            matched_jobs: BTreeSet::new(),
        }),
        created_at: None,
        last_updated_at: None,
    }
}

pub fn business<R: Rng + ?Sized>(rng: &mut R, id: Uuid, n: usize) -> User {
    let contact = contact(rng, n, 0.6);
    let business_name = format!("{} {}", pick(rng, COMPANY_WORDS), pick(rng, COMPANY_SUFFIXES));
    let (job_salary_min, job_salary_max) = salary_bounds(rng, 6000, 20000, 1000, 10000, 100.0);

    User {
        id,
        contact,
        profile: Profile::Business(BusinessProfile {
            logo_url: Some(format!("https://picsum.photos/seed/{}/200", id.simple())),
            job_template: JobTemplate {
                job_title: pick(rng, JOB_TITLES),
                job_description: paragraph(rng, 4),
                job_experience_required: experience(rng),
                job_salary_min,
                job_salary_max,
                job_salary_unit: salary_unit(rng),
            },
            business_name,
            liked_workers: Vec::new(),
            disliked_workers: BTreeMap::new(),
            matched_workers: BTreeSet::new(),
        }),
        created_at: None,
        last_updated_at: None,
    }
}

/// A job posted by `business_id`; about one in seven is remote
pub fn job<R: Rng + ?Sized>(rng: &mut R, id: Uuid, business_id: Uuid) -> Job {
    let location = if rng.gen_bool(0.15) {
        JobLocation::Remote
    } else {
        let (lat, lng) = coordinates(rng);
        JobLocation::OnSite {
            lat,
            lng,
            address: Some(format!(
                "{} {} St, {}",
                rng.gen_range(1..200),
                pick(rng, STREETS),
                pick(rng, CITIES)
            )),
        }
    };
    let (salary_min, salary_max) = salary_bounds(rng, 6000, 20000, 1000, 10000, 100.0);

    Job {
        id,
        business_id,
        title: pick(rng, JOB_TITLES),
        description: paragraph(rng, 5),
        industry: Some(pick(rng, INDUSTRIES)),
        tags: pick_many(rng, TAGS, 1, 4).into_iter().collect(),
        skills_needed: pick_many(rng, SKILLS, 2, 5).into_iter().collect(),
        experience_required: experience(rng),
        salary: SalaryRange {
            salary_min,
            salary_max,
            salary_unit: salary_unit(rng),
        },
        location,
        benefits: pick_many(rng, BENEFITS, 0, 4),
        is_active: true,
        applicants: Vec::new(),
        matches: BTreeSet::new(),
        rejected: BTreeMap::new(),
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use validator::Validate;

    #[test]
    fn generated_records_pass_validation() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in 0..50 {
            let b = business(&mut rng, Uuid::new_v4(), n);
            assert!(worker(&mut rng, Uuid::new_v4(), n).validate().is_ok());
            assert!(b.validate().is_ok());
            assert!(job(&mut rng, Uuid::new_v4(), b.id).validate().is_ok());
        }
    }

    #[test]
    fn pick_many_never_repeats() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let skills = pick_many(&mut rng, SKILLS, 3, 8);
            let distinct: BTreeSet<&String> = skills.iter().collect();
            assert_eq!(distinct.len(), skills.len());
            assert!((3..=8).contains(&skills.len()));
        }
    }
}
