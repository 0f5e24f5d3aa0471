//! Effect trait and context for command execution.
//!
//! Effects are stateless command handlers that perform IO. Commands carry
//! all the data an effect needs; dependencies come from the context.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Context passed to effect handlers.
///
/// Immutable and cheap to clone. Effects only get `deps()`; they never see
/// machine state.
pub struct EffectContext<D> {
    deps: Arc<D>,
}

impl<D> EffectContext<D> {
    pub fn new(deps: Arc<D>) -> Self {
        Self { deps }
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }
}

impl<D> Clone for EffectContext<D> {
    fn clone(&self) -> Self {
        Self {
            deps: Arc::clone(&self.deps),
        }
    }
}

/// Executes one command against external dependencies.
#[async_trait]
pub trait Effect<C: Send + 'static, D: Send + Sync + 'static>: Send + Sync + 'static {
    /// An `Err` is logged by the runtime; it never stops the event loop.
    async fn execute(&self, command: C, ctx: EffectContext<D>) -> Result<()>;
}
