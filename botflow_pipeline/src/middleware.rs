//! Middleware units and the continuation that links them.
//!
//! Each unit receives the turn context, a [`Next`] continuation over the
//! rest of the chain, and the turn's cancellation token. Invoking the
//! continuation runs the remainder of the chain; not invoking it
//! short-circuits the turn. Work on both sides of the `next.run(..)` call
//! gives wrapping semantics for cross-cutting concerns.

use crate::context::TurnContext;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One unit in the ordered middleware chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn on_turn(
        &self,
        ctx: &mut TurnContext,
        next: Next<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError>;
}

/// Terminal handler invoked when the whole chain has continued.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn handle(&self, ctx: &mut TurnContext) -> Result<(), PipelineError>;
}

/// Terminal handler that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl TurnHandler for NoopHandler {
    async fn handle(&self, _ctx: &mut TurnContext) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Continuation over the remaining chain plus the terminal handler.
///
/// Consumed by `run`, so a middleware unit can continue the chain at most
/// once per turn.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn TurnHandler,
}

impl<'a> Next<'a> {
    pub(crate) const fn new(chain: &'a [Arc<dyn Middleware>], terminal: &'a dyn TurnHandler) -> Self {
        Self { chain, terminal }
    }

    /// Run the next middleware unit, or the terminal handler if this was
    /// the last one.
    ///
    /// Refuses to start another unit once the cancellation token has
    /// fired; the chain itself never polls the token on its own.
    pub async fn run(
        self,
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        match self.chain.split_first() {
            Some((head, rest)) => {
                head.on_turn(ctx, Next::new(rest, self.terminal), cancel)
                    .await
            }
            None => self.terminal.handle(ctx).await,
        }
    }
}
