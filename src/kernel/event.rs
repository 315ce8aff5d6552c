use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::UpstreamPayloads;

/// The event that starts a cycle, e.g. a newly saved scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub event_name: String,
    pub story_id: String,
    pub timestamp: DateTime<Utc>,
    /// Where the writer currently is, when the caller knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
}

impl Trigger {
    pub fn new(event_name: &str, story_id: &str) -> Self {
        Self {
            event_name: event_name.to_string(),
            story_id: story_id.to_string(),
            timestamp: Utc::now(),
            chapter: None,
            paragraph: None,
            scene_id: None,
        }
    }

    pub fn at_chapter(mut self, chapter: u32) -> Self {
        self.chapter = Some(chapter);
        self
    }
}

/// Everything one cycle consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRequest {
    pub trigger: Trigger,
    #[serde(flatten)]
    pub payloads: UpstreamPayloads,
}

impl CycleRequest {
    pub fn new(trigger: Trigger, payloads: UpstreamPayloads) -> Self {
        Self { trigger, payloads }
    }
}
