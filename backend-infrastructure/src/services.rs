pub mod api_delivery;
pub mod discord_replier;
pub mod gemini_client;
pub mod health_service;

pub use api_delivery::*;
pub use discord_replier::*;
pub use gemini_client::*;
pub use health_service::*;
