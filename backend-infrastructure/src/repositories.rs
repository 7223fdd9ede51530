pub mod clickhouse_deadlines;
pub mod memory_deadlines;

pub use clickhouse_deadlines::*;
pub use memory_deadlines::*;
