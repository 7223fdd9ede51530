use std::time::Duration;

use backend_domain::{
    CandidateEvent, ChatReplier, EventOutcome, InboundMessage, RecordId, StoreError,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::AppState;

/// Which path ended up persisting a detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPath {
    Delivery,
    LocalStore,
}

impl PersistPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistPath::Delivery => "api",
            PersistPath::LocalStore => "local_store",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestReport {
    Duplicate,
    NoEvent,
    ModelUnavailable,
    Recorded { id: RecordId, via: PersistPath },
    Failed,
}

/// Runs one inbound message through dedup, detection and persistence, and
/// replies to the source. Never fails: every problem becomes a report.
pub async fn handle_message(
    state: &AppState,
    message: &InboundMessage,
    replier: &dyn ChatReplier,
) -> IngestReport {
    state.metrics.record_message();
    let context = message.context(Utc::now());

    if !context.message_id.is_empty() {
        match state.record_store.exists(&context.message_id).await {
            Ok(true) => {
                debug!("message {} already processed, skipping", context.message_id);
                state.metrics.record_duplicate();
                return IngestReport::Duplicate;
            }
            Ok(false) => {}
            Err(err) => warn!(
                "dedup probe failed for message {}: {}",
                context.message_id, err
            ),
        }
    }

    let mut outcome = state.detector.detect(&message.text, &context).await;
    if outcome == EventOutcome::ModelUnavailable {
        state.metrics.record_model_unavailable();
        if let Some(fallback) = &state.fallback_detector {
            info!(
                "model unavailable for message {}, trying {} detector",
                context.message_id,
                fallback.name()
            );
            outcome = fallback.detect(&message.text, &context).await;
        }
    }

    let candidate = match outcome {
        EventOutcome::NoEvent => return IngestReport::NoEvent,
        EventOutcome::ModelUnavailable => return IngestReport::ModelUnavailable,
        EventOutcome::Event(candidate) => *candidate,
    };
    state.metrics.record_detected();

    let report = match persist(state, &candidate).await {
        Ok((id, via)) => {
            match via {
                PersistPath::Delivery => state.metrics.record_delivered(),
                PersistPath::LocalStore => state.metrics.record_stored_locally(),
            }
            info!(
                "recorded '{}' as {} via {} (message {})",
                candidate.title,
                id,
                via.as_str(),
                context.message_id
            );
            IngestReport::Recorded { id, via }
        }
        Err(err) => {
            warn!(
                "could not record '{}' from message {}: {}",
                candidate.title, context.message_id, err
            );
            IngestReport::Failed
        }
    };

    let reply = match report {
        IngestReport::Recorded { .. } => acknowledgement(&candidate),
        _ => failure_warning(&candidate),
    };
    if let Err(err) = replier.reply(message, &reply).await {
        warn!("failed to reply to message {}: {:#}", context.message_id, err);
    }
    report
}

async fn persist(
    state: &AppState,
    candidate: &CandidateEvent,
) -> Result<(RecordId, PersistPath), StoreError> {
    if let Some(delivery) = &state.delivery {
        let timeout = Duration::from_secs(state.config.delivery_timeout_seconds);
        match tokio::time::timeout(timeout, delivery.deliver(candidate)).await {
            Ok(Ok(id)) => return Ok((id, PersistPath::Delivery)),
            Ok(Err(err)) => warn!("delivery failed, storing locally: {:#}", err),
            Err(_) => warn!(
                "delivery timed out after {}s, storing locally",
                timeout.as_secs()
            ),
        }
        state.metrics.record_delivery_failure();
    }

    match state.record_store.upsert(candidate.clone()).await {
        Ok(outcome) => Ok((outcome.into_id(), PersistPath::LocalStore)),
        Err(err) => {
            state.metrics.record_store_error();
            Err(err)
        }
    }
}

pub fn acknowledgement(candidate: &CandidateEvent) -> String {
    let mut text = format!(
        "Recorded {}: **{}** on {}",
        candidate.category, candidate.title, candidate.due_date_canonical
    );
    if !candidate.has_explicit_date() {
        text.push_str(" (no date found, defaulted to today)");
    }
    text
}

pub fn failure_warning(candidate: &CandidateEvent) -> String {
    format!(
        "Detected **{}** but could not save it. Please add it manually.",
        candidate.title
    )
}
