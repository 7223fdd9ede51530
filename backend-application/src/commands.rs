pub mod chat_commands;
pub mod deadline_commands;
pub mod ingest_commands;
pub mod token_commands;
