pub mod types;
pub mod extractor;

pub use types::*;
pub use extractor::InsightExtractor;
