//! Event runtime - a single-consumer actor around one machine.
//!
//! The runtime owns the machine, takes inbound items in delivery order,
//! calls `decide`, and awaits the resulting effect before taking the next
//! item. Nothing else touches machine state, so no lock is needed.

mod effect;
mod machine;

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

pub use effect::{Effect, EffectContext};
pub use machine::{Machine, MachineRunner};

/// One item from the session, already translated for the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<E> {
    Event(E),
    /// The session ended; the runtime stops after this.
    Disconnected { reason: String },
}

/// Why [`Runtime::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Disconnected { reason: String },
    /// The event source ended without a disconnect notice.
    SourceClosed,
}

impl RunOutcome {
    pub fn reason(&self) -> &str {
        match self {
            RunOutcome::Disconnected { reason } => reason,
            RunOutcome::SourceClosed => "event stream closed",
        }
    }
}

pub struct Runtime<M, E, D> {
    runner: MachineRunner<M>,
    effect: E,
    ctx: EffectContext<D>,
}

impl<M, E, D> Runtime<M, E, D>
where
    M: Machine,
    E: Effect<M::Command, D>,
    D: Send + Sync + 'static,
{
    pub fn new(machine: M, effect: E, deps: Arc<D>) -> Self {
        Self {
            runner: MachineRunner::new(machine),
            effect,
            ctx: EffectContext::new(deps),
        }
    }

    pub fn machine(&self) -> &M {
        self.runner.machine()
    }

    /// Consume `inbound` until the session disconnects or the source ends.
    pub async fn run<S>(&mut self, inbound: S) -> RunOutcome
    where
        S: Stream<Item = Inbound<M::Event>>,
    {
        futures::pin_mut!(inbound);

        while let Some(item) = inbound.next().await {
            match item {
                Inbound::Event(event) => self.handle(event).await,
                Inbound::Disconnected { reason } => {
                    info!(reason = %reason, "session disconnected");
                    return RunOutcome::Disconnected { reason };
                }
            }
        }

        warn!("event source closed without disconnect");
        RunOutcome::SourceClosed
    }

    /// Decide on one event and run its command to completion.
    pub async fn handle(&mut self, event: M::Event) {
        let command = match self.runner.decide(&event) {
            Ok(Some(command)) => command,
            // Panics are already logged by the runner
            Ok(None) | Err(_) => return,
        };

        debug!(machine = self.runner.name(), command = ?command, "executing command");

        if let Err(e) = self.effect.execute(command, self.ctx.clone()).await {
            warn!(error = %e, "effect failed");
        }
    }
}
