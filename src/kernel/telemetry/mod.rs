//! Cycle telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (aggregator, extractor,
//! reasoning client or planner).
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain story content (scene text,
//! prompts, model output, suggestion text).
//! Only ids, states, categories, counts and durations are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
