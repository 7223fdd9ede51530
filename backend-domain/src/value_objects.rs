// Domain value objects
pub mod canonical_date;
pub mod category;
pub mod identifiers;

pub use canonical_date::*;
pub use category::*;
pub use identifiers::*;
