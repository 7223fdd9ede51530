pub mod context;
pub mod lifecycle;
pub mod logging;
mod discord_bridge;
mod ingestion_worker;

pub use lifecycle::run_standalone;
pub use logging::{init_logging, load_config};
