use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use tikplays_common::models::OverlayEvent;
use tikplays_common::traits::StateBroadcaster;

use crate::Error;
use crate::services::dispatch::{ActionContext, KeyPresser, KeyToken, RuleAction};

/// Presses one key. The token is parsed on every execution so an
/// unsupported token surfaces as a logged failure, never at load time.
pub struct KeyPressAction {
    token: String,
    presser: Arc<dyn KeyPresser>,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl KeyPressAction {
    pub fn new(token: impl Into<String>, presser: Arc<dyn KeyPresser>, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        Self {
            token: token.into(),
            presser,
            broadcaster,
        }
    }
}

#[async_trait]
impl RuleAction for KeyPressAction {
    fn id(&self) -> &str {
        "key_press"
    }

    fn name(&self) -> &str {
        "Simulate Key Press"
    }

    async fn execute(&self, context: &ActionContext) -> Result<Value, Error> {
        let key: KeyToken = self.token.parse()?;
        self.presser.tap(key).await?;
        self.broadcaster.broadcast(OverlayEvent::Log(format!(
            "[KEY] '{}' for {}",
            key,
            context.trigger.describe()
        )));
        Ok(json!({ "key": key.to_string() }))
    }
}
