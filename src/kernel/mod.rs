pub mod cycle;
pub mod event;
pub mod state;
pub mod telemetry;

pub use cycle::{CycleOrchestrator, CycleOutcome, CycleTrace, StageMark};
pub use event::{CycleRequest, Trigger};
pub use state::{CycleGraph, CycleState, CycleStep};
