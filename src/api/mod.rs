pub mod health;
pub mod job;
pub mod patch;
pub mod records;
pub mod swipe;
pub mod validation;
pub mod worker;
