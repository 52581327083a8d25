//! Per-turn context handed to every middleware unit.
//!
//! A `TurnContext` exclusively owns its inbound activity for the duration
//! of the turn and exposes frame state through the shared cache, resolved
//! against the registered frame definitions.

use botflow_core::{Activity, StateKey};
use botflow_state::cache::FrameCache;
use botflow_state::{Frame, FrameState, HistoryEntry, StateError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Frame definitions available to turns, keyed by `(scope, namespace)`.
///
/// Populated once before the first turn; the pipeline does not define
/// dynamic re-registration mid-flight.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    frames: HashMap<(String, String), Frame>,
}

impl FrameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame definition. `(scope, namespace)` pairs are unique;
    /// a later registration replaces an earlier one.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames
            .insert((frame.scope.clone(), frame.namespace.clone()), frame);
        self
    }

    /// Look up a frame definition.
    #[must_use]
    pub fn get(&self, scope: &str, namespace: &str) -> Option<&Frame> {
        self.frames
            .get(&(scope.to_string(), namespace.to_string()))
    }

    /// Number of registered frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Context for one pipeline execution.
pub struct TurnContext {
    activity: Activity,
    frames: Arc<FrameRegistry>,
    cache: Arc<FrameCache>,
    cancel: CancellationToken,
    replies: Vec<String>,
}

impl TurnContext {
    #[must_use]
    pub fn new(
        activity: Activity,
        frames: Arc<FrameRegistry>,
        cache: Arc<FrameCache>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            activity,
            frames,
            cache,
            cancel,
            replies: Vec::new(),
        }
    }

    /// The inbound activity driving this turn.
    #[must_use]
    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Conversation the turn belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.activity.conversation_id
    }

    /// The turn's cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    fn state_key(&self, scope: &str, namespace: &str) -> StateKey {
        StateKey::new(self.conversation_id(), scope, namespace)
    }

    fn frame(&self, scope: &str, namespace: &str) -> Result<&Frame, StateError> {
        self.frames
            .get(scope, namespace)
            .ok_or_else(|| StateError::UnknownFrame {
                scope: scope.to_string(),
                namespace: namespace.to_string(),
            })
    }

    /// Ensure the frame's state is cached for this conversation.
    pub async fn load_state(&self, scope: &str, namespace: &str) -> Result<(), StateError> {
        self.frame(scope, namespace)?;
        self.cache.load(&self.state_key(scope, namespace)).await
    }

    /// Decoded state of a frame for this conversation.
    pub async fn read_state(&self, scope: &str, namespace: &str) -> Result<FrameState, StateError> {
        self.frame(scope, namespace)?;
        self.cache
            .read_frame(&self.state_key(scope, namespace))
            .await
    }

    /// Replace a frame's state wholesale.
    pub async fn write_state(
        &self,
        scope: &str,
        namespace: &str,
        state: &FrameState,
    ) -> Result<(), StateError> {
        self.frame(scope, namespace)?;
        self.cache
            .write_frame(&self.state_key(scope, namespace), state)
            .await
    }

    /// Set a slot's current value, applying its history policy.
    pub async fn set_slot(
        &self,
        scope: &str,
        namespace: &str,
        slot: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError> {
        let frame = self.frame(scope, namespace)?.clone();
        self.cache
            .set_slot(&self.state_key(scope, namespace), &frame, slot, value, Utc::now())
            .await
    }

    /// Current value of a slot.
    pub async fn slot_value(
        &self,
        scope: &str,
        namespace: &str,
        slot: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        self.frame(scope, namespace)?;
        self.cache
            .slot_value(&self.state_key(scope, namespace), slot)
            .await
    }

    /// Retained history of a slot, oldest first.
    pub async fn slot_history(
        &self,
        scope: &str,
        namespace: &str,
        slot: &str,
    ) -> Result<Vec<HistoryEntry>, StateError> {
        self.frame(scope, namespace)?;
        self.cache
            .slot_history(&self.state_key(scope, namespace), slot)
            .await
    }

    /// Queue an outbound reply for the channel to deliver after the turn.
    pub fn queue_reply(&mut self, text: impl Into<String>) {
        self.replies.push(text.into());
    }

    /// Replies queued so far.
    #[must_use]
    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    /// Drain the queued replies.
    pub fn take_replies(&mut self) -> Vec<String> {
        std::mem::take(&mut self.replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botflow_core::MemoryStore;
    use botflow_state::SlotDefinition;
    use serde_json::json;

    fn context() -> TurnContext {
        let registry = FrameRegistry::new()
            .with_frame(Frame::new("dialog", "user").with_slot(SlotDefinition::new("name")));
        TurnContext::new(
            Activity::message("conv-1", "hi"),
            Arc::new(registry),
            Arc::new(FrameCache::new(Arc::new(MemoryStore::new()))),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn unknown_frame_is_rejected() {
        let ctx = context();
        let result = ctx.read_state("dialog", "nope").await;
        assert!(matches!(result, Err(StateError::UnknownFrame { .. })));
    }

    #[tokio::test]
    async fn slot_roundtrip_through_context() -> anyhow::Result<()> {
        let ctx = context();
        ctx.set_slot("dialog", "user", "name", json!("ada")).await?;
        assert_eq!(
            ctx.slot_value("dialog", "user", "name").await?,
            Some(json!("ada"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn replies_are_drained_once() {
        let mut ctx = context();
        ctx.queue_reply("one");
        ctx.queue_reply("two");

        assert_eq!(ctx.replies().len(), 2);
        assert_eq!(ctx.take_replies(), vec!["one", "two"]);
        assert!(ctx.replies().is_empty());
    }
}
