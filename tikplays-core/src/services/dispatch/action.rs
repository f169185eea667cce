use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::Error;

/// What caused a dispatch. Decides the webhook body and how many times the
/// repeatable actions run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Gift {
        gift_id: String,
        user_id: String,
        quantity: u64,
    },
    LikeStep {
        step: u64,
        bucket: u64,
    },
    Follow,
}

impl Trigger {
    /// Repeatable actions run `repeat_count * multiplier` times.
    pub fn multiplier(&self) -> u64 {
        match self {
            Trigger::Gift { quantity, .. } => (*quantity).max(1),
            Trigger::LikeStep { .. } | Trigger::Follow => 1,
        }
    }

    pub fn webhook_body(&self) -> Value {
        match self {
            Trigger::Gift { gift_id, .. } => json!({ "giftId": gift_id }),
            Trigger::LikeStep { .. } | Trigger::Follow => json!({ "trigger": "special" }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Trigger::Gift { gift_id, user_id, quantity } => format!("gift {} x{} from {}", gift_id, quantity, user_id),
            Trigger::LikeStep { step, bucket } => format!("likes {} (step {})", step * bucket, step),
            Trigger::Follow => "follow".to_string(),
        }
    }
}

/// Per-execution context handed to an action.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub trigger: Trigger,
    pub target_id: String,
    /// 0-based index within the repeat loop.
    pub iteration: u64,
    /// Execution ID for tracking
    pub execution_id: Uuid,
}

impl ActionContext {
    pub fn new(trigger: Trigger, target_id: impl Into<String>, iteration: u64) -> Self {
        Self {
            trigger,
            target_id: target_id.into(),
            iteration,
            execution_id: Uuid::new_v4(),
        }
    }
}

/// One side effect of a rule. Implementations must be cheap to share: the
/// dispatcher runs each execution on its own task.
#[async_trait]
pub trait RuleAction: Send + Sync {
    /// Unique identifier for this action kind
    fn id(&self) -> &str;

    /// Human-readable name for this action
    fn name(&self) -> &str;

    /// Whether the action runs once per repeat. Cues return `false` and
    /// fire once per dispatch.
    fn repeats(&self) -> bool {
        true
    }

    /// Runs one execution; the returned value is only logged.
    async fn execute(&self, context: &ActionContext) -> Result<Value, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gift_triggers_scale_repeats_and_carry_gift_id() {
        let t = Trigger::Gift { gift_id: "5655".into(), user_id: "a".into(), quantity: 3 };
        assert_eq!(t.multiplier(), 3);
        assert_eq!(t.webhook_body(), json!({"giftId": "5655"}));

        assert_eq!(Trigger::Follow.multiplier(), 1);
        assert_eq!(Trigger::LikeStep { step: 100, bucket: 2 }.webhook_body(), json!({"trigger": "special"}));
    }
}
