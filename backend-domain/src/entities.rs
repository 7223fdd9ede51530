// Domain entities
pub mod deadline;
pub mod message;
pub mod model;
pub mod outcome;
pub mod raw_result;

pub use deadline::*;
pub use message::*;
pub use model::*;
pub use outcome::*;
pub use raw_result::*;
