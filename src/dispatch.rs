use tokio::sync::mpsc;

use crate::backend::{BackendClient, ChatReply, SendFailure, GENERIC_ERROR_PREFIX};
use crate::transcript::Turn;

/// Submits one user message and converts whatever happens into a transcript
/// turn. Nothing escapes this boundary as an error; the caller always gets a
/// `Turn` back.
#[derive(Clone)]
pub struct Dispatcher {
    backend: BackendClient,
    health_poke: mpsc::UnboundedSender<()>,
}

impl Dispatcher {
    pub fn new(backend: BackendClient, health_poke: mpsc::UnboundedSender<()>) -> Self {
        Self {
            backend,
            health_poke,
        }
    }

    pub async fn send(&self, text: &str) -> Turn {
        let outcome = self.backend.send_chat(text).await;
        self.resolve(outcome)
    }

    /// Map a send outcome to its turn. A `NoResponse` additionally requests an
    /// immediate health re-check; the turn is returned without waiting on it.
    fn resolve(&self, outcome: Result<ChatReply, SendFailure>) -> Turn {
        if matches!(outcome, Err(SendFailure::NoResponse)) {
            let _ = self.health_poke.send(());
        }
        outcome_turn(outcome)
    }
}

pub fn outcome_turn(outcome: Result<ChatReply, SendFailure>) -> Turn {
    match outcome {
        Ok(reply) => Turn::agent(reply.response, reply.agent_used),
        Err(failure) => Turn::error(failure.user_message()),
    }
}

/// Turn used when the spawned send task itself dies (panic or abort), so the
/// submission lifecycle still completes with an error turn.
pub fn task_failure_turn(err: &tokio::task::JoinError) -> Turn {
    Turn::error(format!("{GENERIC_ERROR_PREFIX}{err}"))
}
