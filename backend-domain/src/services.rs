// Pure domain services: no I/O, deterministic given a reference date

pub mod date_normalizer;
pub mod field_extractor;
pub mod legacy_detector;
pub mod response_parser;

pub use date_normalizer::*;
pub use field_extractor::*;
pub use legacy_detector::*;
pub use response_parser::*;
