use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clickhouse::Client;
use tracing::{info, warn};

use backend_application::{AppState, ExtractionPipeline, Metrics, RecordStore, TokenService};
use backend_domain::{
    DbConfig, DeadlineDelivery, DeadlineRepository, EventDetector, LegacyPatternDetector,
};
use backend_infrastructure::{
    ApiDeadlineDelivery, AppConfig, ClickhouseDeadlineRepository, DefaultHealthService,
    DiscordReplier, GeminiModelClient, InMemoryDeadlineRepository, STORAGE_MEMORY,
};

pub struct AppContext {
    pub state: AppState,
    /// Present when a Discord token is configured; drives the gateway bridge.
    pub replier: Option<Arc<DiscordReplier>>,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let repo = build_repository(&db_config);
        let record_store = Arc::new(RecordStore::new(
            repo,
            Duration::from_secs(runtime_config.store_timeout_seconds),
        ));
        record_store.connect().await?;
        match DefaultHealthService::new(record_store.clone())
            .check_database()
            .await
        {
            Ok(_) => info!("record store ready (backend={})", db_config.storage_backend),
            Err(err) => warn!("record store not answering pings yet: {:#}", err),
        }

        let model_timeout = Duration::from_secs(runtime_config.model_timeout_seconds);
        let gemini = GeminiModelClient::new(config.to_model_config(), model_timeout)?;
        if !gemini.is_configured() {
            warn!("gemini_api_key not configured, the model will report unavailable");
        }
        let model_budget = gemini.call_budget();
        let detector: Arc<dyn EventDetector> =
            Arc::new(ExtractionPipeline::new(Arc::new(gemini), model_budget));
        let fallback_detector: Option<Arc<dyn EventDetector>> =
            if runtime_config.legacy_detector_enabled {
                Some(Arc::new(LegacyPatternDetector::new()))
            } else {
                None
            };

        let delivery: Option<Arc<dyn DeadlineDelivery>> =
            match (&runtime_config.api_base_url, &runtime_config.bot_api_key) {
                (Some(base_url), Some(api_key)) => Some(Arc::new(ApiDeadlineDelivery::new(
                    base_url.clone(),
                    api_key.clone(),
                    Duration::from_secs(runtime_config.delivery_timeout_seconds),
                )?)),
                (Some(_), None) => {
                    warn!("api_base_url set without bot_api_key, storing events locally");
                    None
                }
                _ => None,
            };

        let replier = match &runtime_config.discord_token {
            Some(token) => Some(Arc::new(DiscordReplier::new(
                runtime_config.discord_api_base.clone(),
                token.clone(),
                Duration::from_secs(runtime_config.request_timeout_seconds),
            )?)),
            None => None,
        };

        let tokens = Arc::new(TokenService::new(
            &runtime_config.jwt_secret,
            runtime_config.token_expire_minutes,
        ));

        let state = AppState {
            config: runtime_config,
            record_store,
            detector,
            fallback_detector,
            delivery,
            tokens,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state, replier })
    }
}

fn build_repository(db_config: &DbConfig) -> Arc<dyn DeadlineRepository> {
    if db_config.storage_backend == STORAGE_MEMORY {
        warn!("using in-memory storage, records are lost on restart");
        return Arc::new(InMemoryDeadlineRepository::new());
    }

    let mut clickhouse = Client::default()
        .with_url(&db_config.clickhouse_url)
        .with_database(&db_config.clickhouse_database);
    if let Some(user) = &db_config.clickhouse_user {
        clickhouse = clickhouse.with_user(user);
    }
    if let Some(password) = &db_config.clickhouse_password {
        clickhouse = clickhouse.with_password(password);
    }
    Arc::new(ClickhouseDeadlineRepository::new(
        clickhouse,
        db_config.clickhouse_database.clone(),
    ))
}
