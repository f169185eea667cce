use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use tikplays_common::models::OverlayEvent;
use tikplays_common::traits::StateBroadcaster;

use crate::Error;
use crate::http::HttpClient;
use crate::services::dispatch::{ActionContext, RuleAction};

const EXEC_PATH: &str = "/v1/server/exec";
const MAX_DETAIL_CHARS: usize = 200;

/// Submits a console command to the game server's HTTP bridge.
pub struct CommandAction {
    command: String,
    base_url: String,
    http: Arc<dyn HttpClient>,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl CommandAction {
    pub fn new(
        command: impl Into<String>,
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        broadcaster: Arc<dyn StateBroadcaster>,
    ) -> Self {
        Self {
            command: command.into(),
            base_url: base_url.into(),
            http,
            broadcaster,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), EXEC_PATH)
    }
}

#[async_trait]
impl RuleAction for CommandAction {
    fn id(&self) -> &str {
        "command"
    }

    fn name(&self) -> &str {
        "Game Server Command"
    }

    async fn execute(&self, _context: &ActionContext) -> Result<Value, Error> {
        let endpoint = self.endpoint();
        let resp = self
            .http
            .post_form(&endpoint, &[("command", self.command.as_str())])
            .await
            .map_err(|e| Error::Command {
                status: None,
                detail: e.to_string(),
            })?;

        if !resp.is_success() {
            let detail: String = resp.body.chars().take(MAX_DETAIL_CHARS).collect();
            return Err(Error::Command {
                status: Some(resp.status),
                detail,
            });
        }

        self.broadcaster
            .broadcast(OverlayEvent::Log(format!("[CMD] {}", self.command)));
        Ok(json!({ "status": resp.status }))
    }
}
