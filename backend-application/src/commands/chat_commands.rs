use backend_domain::{DeadlineFilter, StoredDeadline};
use tracing::warn;

use crate::AppState;

pub const RECENT_DEADLINES_LIMIT: usize = 5;

pub const HELP_TEXT: &str = "**Deadline Tracker Bot Commands**\n\
`!deadlines` - List the most recent deadlines\n\
`!help_bot` - Display this help message\n\n\
This bot automatically detects and tracks events and deadlines mentioned in conversations.";

/// Chat commands the bridge answers directly instead of running extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Deadlines,
    Help,
}

impl ChatCommand {
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        match first.to_lowercase().as_str() {
            "!deadlines" => Some(ChatCommand::Deadlines),
            "!help_bot" => Some(ChatCommand::Help),
            _ => None,
        }
    }
}

pub async fn run_chat_command(state: &AppState, command: ChatCommand) -> String {
    match command {
        ChatCommand::Help => HELP_TEXT.to_string(),
        ChatCommand::Deadlines => recent_deadlines_reply(state).await,
    }
}

async fn recent_deadlines_reply(state: &AppState) -> String {
    match state
        .record_store
        .list(0, RECENT_DEADLINES_LIMIT, &DeadlineFilter::default())
        .await
    {
        Ok(records) => format_deadline_lines(&records),
        Err(err) => {
            warn!("failed to list deadlines for chat command: {}", err);
            "Could not load deadlines right now. Please try again later.".to_string()
        }
    }
}

pub fn format_deadline_lines(records: &[StoredDeadline]) -> String {
    if records.is_empty() {
        return "No deadlines recorded yet.".to_string();
    }
    let mut out = String::from("**Recent deadlines**");
    for record in records {
        let event = &record.event;
        out.push_str(&format!(
            "\n- {} **{}** ({}, {})",
            event.due_date_canonical, event.title, event.organization, event.category
        ));
    }
    out
}
