//! End-to-end turn driver.
//!
//! `TurnProcessor` is what a channel hands activities to: it builds the
//! per-turn context, runs the middleware chain, and sweeps the
//! conversation's dirty frames to the backing store afterwards.

use crate::context::{FrameRegistry, TurnContext};
use crate::error::PipelineError;
use crate::pipeline::{TurnOutcome, TurnPipeline};
use botflow_core::Activity;
use botflow_state::cache::FrameCache;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What one processed turn produced.
#[derive(Debug)]
pub struct TurnReport {
    /// How the pipeline run ended
    pub outcome: TurnOutcome,
    /// Replies queued by middleware, in order
    pub replies: Vec<String>,
    /// Number of frames written to the backing store at end of turn
    pub flushed: usize,
}

/// Drives one turn at a time through a pipeline and a frame cache.
///
/// Turns for different conversations may be processed concurrently from
/// separate tasks; the cache serializes state access per key.
pub struct TurnProcessor {
    pipeline: TurnPipeline,
    cache: Arc<FrameCache>,
    frames: Arc<FrameRegistry>,
}

impl TurnProcessor {
    #[must_use]
    pub fn new(pipeline: TurnPipeline, cache: Arc<FrameCache>, frames: FrameRegistry) -> Self {
        Self {
            pipeline,
            cache,
            frames: Arc::new(frames),
        }
    }

    /// Shared handle to the frame cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<FrameCache> {
        &self.cache
    }

    /// Process one inbound activity.
    ///
    /// The end-of-turn flush runs after the whole chain, for completed and
    /// short-circuited turns alike. Faulted and cancelled turns skip it:
    /// their in-memory state stays dirty for a later flush attempt.
    pub async fn process_turn(
        &self,
        activity: Activity,
        cancel: CancellationToken,
    ) -> Result<TurnReport, PipelineError> {
        let conversation_id = activity.conversation_id.clone();
        let mut ctx = TurnContext::new(
            activity,
            self.frames.clone(),
            self.cache.clone(),
            cancel.clone(),
        );

        let outcome = self.pipeline.run(&mut ctx, &cancel).await?;

        let flushed = if cancel.is_cancelled() {
            debug!("Skipping end-of-turn flush for {conversation_id}: cancelled");
            0
        } else {
            self.cache.flush_conversation(&conversation_id).await?
        };

        Ok(TurnReport {
            outcome,
            replies: ctx.take_replies(),
            flushed,
        })
    }

    /// End a conversation session: evict its cached frames.
    pub fn close_conversation(&self, conversation_id: &str) {
        self.cache.close_conversation(conversation_id);
    }
}
