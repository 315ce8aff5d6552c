pub mod intervention;
pub mod types;

pub use intervention::{rank, Candidate, InterventionPlanner, Ranking};
pub use types::*;
