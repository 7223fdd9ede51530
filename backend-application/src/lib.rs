// Backend Application Layer

pub mod auth;
pub mod commands;
pub mod error;
pub mod extraction;
pub mod metrics;
pub mod queries;
pub mod record_store;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::TokenService;
pub use error::AppError;
pub use extraction::ExtractionPipeline;
pub use metrics::Metrics;
pub use record_store::RecordStore;
pub use state::AppState;
