pub mod dto;
pub mod handlers;
pub mod service;

pub use handlers::worker_config;
pub use service::WorkerService;
