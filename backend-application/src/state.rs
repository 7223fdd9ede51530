use std::sync::Arc;

use backend_domain::{DeadlineDelivery, EventDetector, RuntimeConfig};

use crate::{Metrics, RecordStore, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub record_store: Arc<RecordStore>,
    pub detector: Arc<dyn EventDetector>,
    /// Consulted only when `detector` reports the model unavailable.
    pub fallback_detector: Option<Arc<dyn EventDetector>>,
    /// Outbound API that persists on our behalf; `None` writes locally.
    pub delivery: Option<Arc<dyn DeadlineDelivery>>,
    pub tokens: Arc<TokenService>,
    pub metrics: Arc<Metrics>,
}
