use tokio::sync::{mpsc, oneshot};

use tikplays_common::Error;
use tikplays_common::models::LiveEvent;

use crate::engine::commands::{CommandReply, OperatorCommand};

/// Everything the engine loop consumes besides its own countdown ticks.
#[derive(Debug)]
pub enum EngineInput {
    Live(LiveEvent),
    Command {
        command: OperatorCommand,
        reply: oneshot::Sender<Result<CommandReply, Error>>,
    },
}

/// Cloneable sender held by adapters.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineInput>,
}

impl EngineHandle {
    pub fn new(tx: mpsc::Sender<EngineInput>) -> Self {
        Self { tx }
    }

    pub async fn live(&self, event: LiveEvent) -> Result<(), Error> {
        self.tx
            .send(EngineInput::Live(event))
            .await
            .map_err(|_| Error::EventBus("engine has stopped".into()))
    }

    pub async fn command(&self, command: OperatorCommand) -> Result<CommandReply, Error> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineInput::Command { command, reply })
            .await
            .map_err(|_| Error::EventBus("engine has stopped".into()))?;
        rx.await
            .map_err(|_| Error::EventBus("engine dropped the reply".into()))?
    }
}
