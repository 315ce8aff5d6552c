pub mod types;
pub mod payload;
pub mod aggregator;

pub use types::*;
pub use payload::UpstreamPayloads;
pub use aggregator::*;
