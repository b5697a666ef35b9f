pub mod common;
pub mod job;
pub mod user;

pub use common::{ExperienceLevel, Role, SalaryRange, SalaryUnit};
pub use job::{Job, JobLocation};
pub use user::{BusinessProfile, Contact, JobTemplate, Profile, User, WorkerProfile};
