//! Ordered middleware execution.
//!
//! The pipeline executes registered units strictly in registration order,
//! each at most once per turn. A unit that never invokes its continuation
//! short-circuits the rest of the chain, terminal handler included.

use crate::context::TurnContext;
use crate::error::PipelineError;
use crate::middleware::{Middleware, Next, NoopHandler, TurnHandler};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a pipeline run ended, short of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Every unit continued and the terminal handler ran to completion.
    Completed,
    /// Some unit never called its continuation.
    ShortCircuited,
}

/// Wraps the terminal handler to observe whether the chain reached it.
struct TerminalTracker<'h> {
    inner: &'h dyn TurnHandler,
    reached: AtomicBool,
}

#[async_trait]
impl TurnHandler for TerminalTracker<'_> {
    async fn handle(&self, ctx: &mut TurnContext) -> Result<(), PipelineError> {
        self.reached.store(true, Ordering::SeqCst);
        self.inner.handle(ctx).await
    }
}

/// Ordered middleware chain.
///
/// Registration happens before the first run; duplicates are permitted and
/// each instance executes independently.
#[derive(Default)]
pub struct TurnPipeline {
    chain: Vec<Arc<dyn Middleware>>,
}

impl TurnPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware unit to the chain.
    pub fn register(&mut self, middleware: impl Middleware + 'static) {
        self.chain.push(Arc::new(middleware));
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.register(middleware);
        self
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Run the chain with a no-op terminal handler.
    pub async fn run(
        &self,
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, PipelineError> {
        self.run_with_handler(ctx, &NoopHandler, cancel).await
    }

    /// Run the chain, invoking `handler` when every unit has continued.
    ///
    /// Faults propagate out of this call unchanged; post-continuation code
    /// in units already entered runs as the error unwinds. The pipeline
    /// neither catches nor retries.
    pub async fn run_with_handler(
        &self,
        ctx: &mut TurnContext,
        handler: &dyn TurnHandler,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, PipelineError> {
        let tracker = TerminalTracker {
            inner: handler,
            reached: AtomicBool::new(false),
        };

        Next::new(&self.chain, &tracker).run(ctx, cancel).await?;

        let outcome = if tracker.reached.load(Ordering::SeqCst) {
            TurnOutcome::Completed
        } else {
            TurnOutcome::ShortCircuited
        };
        debug!("Pipeline run finished: {outcome:?}");
        Ok(outcome)
    }
}

impl std::fmt::Debug for TurnPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnPipeline")
            .field("units", &self.chain.len())
            .finish()
    }
}
