//! Fans a resolved rule out into independently running side effects.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tikplays_common::models::{ActionRule, Capability};
use tikplays_common::traits::StateBroadcaster;

use crate::http::HttpClient;
use crate::services::dispatch::actions::{
    CommandAction, KeyPressAction, SoundCueAction, VideoCueAction, WebhookAction,
};
use crate::services::dispatch::{ActionContext, KeyPresser, RuleAction, Trigger};

/// Collaborators the actions talk to.
#[derive(Clone)]
pub struct ActionServices {
    pub http: Arc<dyn HttpClient>,
    pub keys: Arc<dyn KeyPresser>,
    pub broadcaster: Arc<dyn StateBroadcaster>,
}

/// Handles of the tasks started by one dispatch. Dropping it detaches the
/// tasks; they keep running.
#[derive(Debug, Default)]
pub struct Dispatched {
    handles: Vec<JoinHandle<()>>,
}

impl Dispatched {
    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every started task. Only tests and shutdown paths need this.
    pub async fn settled(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

pub struct ActionDispatcher {
    services: ActionServices,
    command_base: String,
}

impl ActionDispatcher {
    pub fn new(services: ActionServices, command_base: impl Into<String>) -> Self {
        Self {
            services,
            command_base: command_base.into(),
        }
    }

    pub fn command_base(&self) -> &str {
        &self.command_base
    }

    pub fn set_command_base(&mut self, base: impl Into<String>) {
        let base = base.into();
        if base != self.command_base {
            info!("Command sink base is now {}", base);
            self.command_base = base;
        }
    }

    /// One action per capability. Capabilities that cannot be built (a
    /// webhook with a non-HTTP URL) are skipped with a warning.
    pub fn build_actions(&self, rule: &ActionRule) -> Vec<Arc<dyn RuleAction>> {
        let s = &self.services;
        let mut actions: Vec<Arc<dyn RuleAction>> = Vec::with_capacity(rule.capabilities.len());
        for cap in &rule.capabilities {
            match cap {
                Capability::Webhook { url } => match WebhookAction::new(url, s.http.clone()) {
                    Ok(a) => actions.push(Arc::new(a)),
                    Err(e) => warn!("Rule '{}': skipping webhook: {}", rule.target_id, e),
                },
                Capability::KeyPress { token } => actions.push(Arc::new(KeyPressAction::new(
                    token.clone(),
                    s.keys.clone(),
                    s.broadcaster.clone(),
                ))),
                Capability::Command { command } => actions.push(Arc::new(CommandAction::new(
                    command.clone(),
                    self.command_base.clone(),
                    s.http.clone(),
                    s.broadcaster.clone(),
                ))),
                Capability::Sound { url, volume } => {
                    actions.push(Arc::new(SoundCueAction::new(url.clone(), *volume, s.broadcaster.clone())))
                }
                Capability::Video { url, volume, looped } => actions.push(Arc::new(VideoCueAction::new(
                    url.clone(),
                    *volume,
                    *looped,
                    s.broadcaster.clone(),
                ))),
            }
        }
        actions
    }

    /// Starts one task per action and returns at once. Each task runs its
    /// action's executions back to back.
    pub fn dispatch(&self, rule: &ActionRule, trigger: Trigger) -> Dispatched {
        let repeats = u64::from(rule.repeat_count).saturating_mul(trigger.multiplier());
        let handles: Vec<_> = self
            .build_actions(rule)
            .into_iter()
            .map(|action| {
                let runs = if action.repeats() { repeats } else { 1 };
                tokio::spawn(run_action(action, trigger.clone(), rule.target_id.clone(), runs))
            })
            .collect();

        debug!(
            "Dispatched rule '{}' for {}: {} action(s), {} run(s) each",
            rule.target_id,
            trigger.describe(),
            handles.len(),
            repeats
        );
        Dispatched { handles }
    }
}

async fn run_action(action: Arc<dyn RuleAction>, trigger: Trigger, target_id: String, runs: u64) {
    for iteration in 0..runs {
        let ctx = ActionContext::new(trigger.clone(), target_id.clone(), iteration);
        match action.execute(&ctx).await {
            Ok(outcome) => debug!(
                "[{}] {} ok for rule '{}': {}",
                ctx.execution_id,
                action.name(),
                ctx.target_id,
                outcome
            ),
            Err(e) => warn!(
                "[{}] action '{}' for rule '{}' failed: {}",
                ctx.execution_id,
                action.id(),
                ctx.target_id,
                e
            ),
        }
    }
}
