pub mod dto;
pub mod handlers;
pub mod service;

pub use handlers::swipe_config;
pub use service::SwipeService;
