//! Built-in middleware units.

use crate::context::TurnContext;
use crate::error::PipelineError;
use crate::middleware::{Middleware, Next};
use async_trait::async_trait;
use botflow_state::cache::FrameCache;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Logs each turn symmetrically around the rest of the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnLogging;

#[async_trait]
impl Middleware for TurnLogging {
    async fn on_turn(
        &self,
        ctx: &mut TurnContext,
        next: Next<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let conversation = ctx.conversation_id().to_string();
        let kind = ctx.activity().kind;
        info!("Turn started: conversation={conversation} kind={kind:?}");

        let started = Instant::now();
        let result = next.run(ctx, cancel).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(()) => info!("Turn finished: conversation={conversation} elapsed={elapsed:?}"),
            Err(e) => warn!("Turn failed: conversation={conversation} error={e}"),
        }
        result
    }
}

/// Flushes the conversation's dirty frames after the rest of the chain.
///
/// The wrapping form of the end-of-turn flush: state written by any later
/// unit is persisted on the way back out. Skips the flush when the turn
/// was cancelled, leaving entries dirty for a later attempt.
pub struct StateFlush {
    cache: Arc<FrameCache>,
}

impl StateFlush {
    #[must_use]
    pub fn new(cache: Arc<FrameCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Middleware for StateFlush {
    async fn on_turn(
        &self,
        ctx: &mut TurnContext,
        next: Next<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let conversation = ctx.conversation_id().to_string();

        next.run(ctx, cancel).await?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let written = self.cache.flush_conversation(&conversation).await?;
        if written > 0 {
            info!("Flushed {written} frame(s) for conversation {conversation}");
        }
        Ok(())
    }
}
