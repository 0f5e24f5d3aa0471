//! Machine trait and panic-guarded runner.
//!
//! Machines are pure state machines that interpret events and decide on
//! commands. State lives inside the machine and `decide` is synchronous.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

/// A state machine that interprets events and decides on commands.
///
/// # Guarantees
///
/// - Called synchronously (no async)
/// - Called serially (no concurrent calls)
/// - At most one command per event
pub trait Machine: Send + 'static {
    type Event: std::fmt::Debug + Send + 'static;
    type Command: std::fmt::Debug + Send + 'static;

    fn decide(&mut self, event: &Self::Event) -> Option<Self::Command>;
}

/// Wraps a machine so a panic in `decide` is reported instead of unwinding
/// through the runtime.
pub struct MachineRunner<M> {
    inner: M,
    name: &'static str,
}

impl<M: Machine> MachineRunner<M> {
    pub fn new(machine: M) -> Self {
        Self {
            inner: machine,
            name: std::any::type_name::<M>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn machine(&self) -> &M {
        &self.inner
    }

    /// Returns `Err(message)` if the machine panics.
    pub fn decide(&mut self, event: &M::Event) -> Result<Option<M::Command>, String> {
        // AssertUnwindSafe: &mut M is not UnwindSafe; a panicking machine
        // keeps whatever state it had reached.
        let result = catch_unwind(AssertUnwindSafe(|| self.inner.decide(event)));

        result.map_err(|panic| {
            let message = panic_message(panic.as_ref());
            error!(machine = self.name, event = ?event, "machine panicked: {}", message);
            message
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
