//! Sound and video cues. They are broadcast to observers, not played here,
//! and fire once per dispatch regardless of the repeat count.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use tikplays_common::models::OverlayEvent;
use tikplays_common::models::overlay::{SoundCue, VideoCue};
use tikplays_common::sanitize::clamp_unit;
use tikplays_common::traits::StateBroadcaster;

use crate::Error;
use crate::services::dispatch::{ActionContext, RuleAction};

pub struct SoundCueAction {
    cue: SoundCue,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl SoundCueAction {
    pub fn new(url: impl Into<String>, volume: f64, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        Self {
            cue: SoundCue {
                url: url.into(),
                volume: clamp_unit(volume),
            },
            broadcaster,
        }
    }
}

#[async_trait]
impl RuleAction for SoundCueAction {
    fn id(&self) -> &str {
        "sound_cue"
    }

    fn name(&self) -> &str {
        "Play Sound"
    }

    fn repeats(&self) -> bool {
        false
    }

    async fn execute(&self, _context: &ActionContext) -> Result<Value, Error> {
        self.broadcaster.broadcast(OverlayEvent::PlaySound(self.cue.clone()));
        Ok(json!({ "url": self.cue.url }))
    }
}

pub struct VideoCueAction {
    cue: VideoCue,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl VideoCueAction {
    pub fn new(url: impl Into<String>, volume: f64, looped: bool, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        Self {
            cue: VideoCue {
                url: url.into(),
                volume: clamp_unit(volume),
                looped,
            },
            broadcaster,
        }
    }
}

#[async_trait]
impl RuleAction for VideoCueAction {
    fn id(&self) -> &str {
        "video_cue"
    }

    fn name(&self) -> &str {
        "Play Video"
    }

    fn repeats(&self) -> bool {
        false
    }

    async fn execute(&self, _context: &ActionContext) -> Result<Value, Error> {
        self.broadcaster.broadcast(OverlayEvent::PlayVideo(self.cue.clone()));
        Ok(json!({ "url": self.cue.url, "loop": self.cue.looped }))
    }
}
