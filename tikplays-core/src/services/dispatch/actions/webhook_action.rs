use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use crate::Error;
use crate::http::HttpClient;
use crate::services::dispatch::{ActionContext, RuleAction};

/// POSTs the trigger's JSON body to the rule's URL.
pub struct WebhookAction {
    url: Url,
    http: Arc<dyn HttpClient>,
}

impl WebhookAction {
    /// Only `http`/`https` URLs make a webhook; anything else is refused.
    pub fn new(url: &str, http: Arc<dyn HttpClient>) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Webhook(format!("unsupported scheme '{}' in {}", url.scheme(), url)));
        }
        Ok(Self { url, http })
    }
}

#[async_trait]
impl RuleAction for WebhookAction {
    fn id(&self) -> &str {
        "webhook"
    }

    fn name(&self) -> &str {
        "Webhook POST"
    }

    async fn execute(&self, context: &ActionContext) -> Result<Value, Error> {
        let body = context.trigger.webhook_body();
        let resp = self.http.post_json(self.url.as_str(), &body).await?;
        if !resp.is_success() {
            return Err(Error::Webhook(format!("{} answered {}", self.url, resp.status)));
        }
        tracing::debug!("Webhook {} ok for {}", self.url, context.target_id);
        Ok(json!({ "status": resp.status }))
    }
}
