pub mod bot_handlers;
pub mod deadline_handlers;
pub mod ops_handlers;
pub mod token_handlers;

pub use bot_handlers::*;
pub use deadline_handlers::*;
pub use ops_handlers::*;
pub use token_handlers::*;
