pub mod config;
pub mod context;
pub mod error;
pub mod insight;
pub mod kernel;
pub mod planner;
pub mod services;

// Re-export specific items for convenient access
pub use config::PipelineConfig;
pub use kernel::cycle::CycleOrchestrator;
pub use kernel::event::{CycleRequest, Trigger};
pub use planner::InterventionPlan;
