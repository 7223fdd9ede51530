// Extraction pipeline
// Model call -> tolerant parse -> field extraction, degrading to NoEvent / ModelUnavailable

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend_domain::{
    extract_candidate, interpret_response, today_local, EventDetector, EventOutcome,
    GenerationConfig, MessageContext, ModelClient,
};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub const EXTRACTION_PROMPT: &str = r#"You detect club announcements, events and deadlines in chat messages.

Analyze the message and look for:
1. Club events or meetings
2. Application or registration deadlines
3. Any other important dates
4. General club announcements

When something is found, extract its title, the primary date, the club or
organization, the location, the time of day and any links.

Respond with a single JSON object of this shape:
{
  "has_event": true/false,
  "title": "Title or name of the event/announcement",
  "date_str": "The primary date mentioned (event date or deadline)",
  "club": "Club or organization name",
  "description": "Brief description",
  "location": "Location if mentioned",
  "time": "Time if mentioned",
  "links": ["links", "found"],
  "category": "event/deadline/meeting/announcement"
}

Date guidance:
- Copy specific dates as written (e.g. "April 15th, 2023").
- Use "today" or "tomorrow" for events on the current or next day.
- Dates without a year are in the current year.

Return only the JSON, without markdown or code fences.
If nothing is found, return {"has_event": false}.
If the channel name names a club, use it."#;

pub fn model_input(channel_name: &str, text: &str) -> String {
    if channel_name.trim().is_empty() {
        text.to_string()
    } else {
        format!("Channel: {}\nMessage: {}", channel_name, text)
    }
}

pub struct ExtractionPipeline {
    model: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl ExtractionPipeline {
    pub fn new(model: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub async fn process(&self, text: &str, context: &MessageContext) -> EventOutcome {
        self.process_with_reference(text, context, today_local()).await
    }

    pub async fn process_with_reference(
        &self,
        text: &str,
        context: &MessageContext,
        reference: NaiveDate,
    ) -> EventOutcome {
        let input = model_input(&context.channel_name, text);
        let call = self
            .model
            .generate(EXTRACTION_PROMPT, &input, &GenerationConfig::EXTRACTION);

        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!("model call failed for message {}: {:#}", context.message_id, err);
                return EventOutcome::ModelUnavailable;
            }
            Err(_) => {
                warn!(
                    "model call for message {} timed out after {}s",
                    context.message_id,
                    self.timeout.as_secs()
                );
                return EventOutcome::ModelUnavailable;
            }
        };

        let raw = match interpret_response(&response) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no event in message {}", context.message_id);
                return EventOutcome::NoEvent;
            }
            Err(err) => {
                warn!("unusable model response for message {}: {}", context.message_id, err);
                return EventOutcome::NoEvent;
            }
        };

        let candidate = extract_candidate(&raw, context, reference);
        if raw.date_expression.is_some() && !candidate.has_explicit_date() {
            warn!(
                "could not parse date {:?} for message {}, defaulted to {}",
                raw.date_expression, context.message_id, candidate.due_date_canonical
            );
        }
        EventOutcome::event(candidate)
    }
}

#[async_trait]
impl EventDetector for ExtractionPipeline {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn detect(&self, text: &str, context: &MessageContext) -> EventOutcome {
        self.process(text, context).await
    }
}
