use crate::entities::CandidateEvent;

/// Result of running one message through a detector.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    NoEvent,
    Event(Box<CandidateEvent>),
    ModelUnavailable,
}

impl EventOutcome {
    pub fn event(candidate: CandidateEvent) -> Self {
        EventOutcome::Event(Box::new(candidate))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::NoEvent => "no_event",
            EventOutcome::Event(_) => "event",
            EventOutcome::ModelUnavailable => "model_unavailable",
        }
    }
}
