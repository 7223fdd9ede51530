use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use backend_application::commands::ingest_commands::handle_message;
use backend_application::AppState;
use backend_domain::{ChatReplier, InboundMessage};

/// Single consumer: each message is handled to completion before the next.
pub fn spawn_ingestion_worker(
    state: AppState,
    replier: Arc<dyn ChatReplier>,
) -> (mpsc::Sender<InboundMessage>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(state.config.ingest_queue_capacity.max(1));
    let handle = tokio::spawn(run_ingestion_worker(state, replier, rx));
    (tx, handle)
}

async fn run_ingestion_worker(
    state: AppState,
    replier: Arc<dyn ChatReplier>,
    mut rx: mpsc::Receiver<InboundMessage>,
) {
    info!("ingestion worker started");
    while let Some(message) = rx.recv().await {
        let report = handle_message(&state, &message, replier.as_ref()).await;
        debug!(message_id = %message.message_id, ?report, "message handled");
    }
    info!("ingestion worker stopped after {} recorded events", state.metrics.events_recorded());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use backend_application::{Metrics, RecordStore, TokenService};
    use backend_domain::{DeadlineFilter, LegacyPatternDetector, RuntimeConfig};
    use backend_infrastructure::InMemoryDeadlineRepository;

    use super::*;

    #[derive(Default)]
    struct CollectingReplier {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatReplier for CollectingReplier {
        async fn reply(&self, _message: &InboundMessage, text: &str) -> Result<()> {
            self.replies.lock().await.push(text.to_string());
            Ok(())
        }
    }

    fn state() -> AppState {
        let config = RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            cors_origins: Vec::new(),
            jwt_secret: "worker-secret".to_string(),
            token_expire_minutes: 60,
            admin_username: "admin".to_string(),
            admin_password: None,
            bot_api_key: None,
            api_base_url: None,
            model_timeout_seconds: 1,
            store_timeout_seconds: 1,
            delivery_timeout_seconds: 1,
            request_timeout_seconds: 5,
            max_body_bytes: 1024,
            discord_token: None,
            discord_guild_ids: Vec::new(),
            discord_gateway_url: String::new(),
            discord_api_base: String::new(),
            legacy_detector_enabled: true,
            ingest_queue_capacity: 4,
        };
        AppState {
            tokens: Arc::new(TokenService::new(&config.jwt_secret, 60)),
            config,
            record_store: Arc::new(RecordStore::new(
                Arc::new(InMemoryDeadlineRepository::new()),
                Duration::from_secs(1),
            )),
            detector: Arc::new(LegacyPatternDetector::new()),
            fallback_detector: None,
            delivery: None,
            metrics: Arc::new(Metrics::default()),
        }
    }

    fn message(id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: id.to_string(),
            text: text.to_string(),
            channel_id: "555".to_string(),
            channel_name: "cs101-assignments".to_string(),
            guild_id: Some("1".to_string()),
            guild_name: "Campus".to_string(),
            author_id: "42".to_string(),
            author_name: "alex".to_string(),
            permalink: format!("https://discord.com/channels/1/555/{}", id),
        }
    }

    #[tokio::test]
    async fn worker_drains_queue_in_order() {
        let state = state();
        let replier = Arc::new(CollectingReplier::default());
        let (tx, handle) = spawn_ingestion_worker(state.clone(), replier.clone());

        tx.send(message("m-1", "PS4 due April 15, 2030. Upload the PDF."))
            .await
            .expect("queue");
        tx.send(message("m-1", "PS4 due April 15, 2030. Upload the PDF."))
            .await
            .expect("queue");
        tx.send(message("m-2", "lunch anyone?")).await.expect("queue");
        drop(tx);
        handle.await.expect("worker");

        let records = state
            .record_store
            .list(0, 10, &DeadlineFilter::default())
            .await
            .expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event.due_date_canonical, "2030-04-15");
        assert_eq!(state.metrics.events_recorded(), 1);

        let replies = replier.replies.lock().await;
        assert_eq!(replies.len(), 1);
    }
}
