//! Demo middleware for the console channel.

use async_trait::async_trait;
use botflow_pipeline::{Middleware, Next, PipelineError, TurnContext};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const SCOPE: &str = "conversation";
const NAMESPACE: &str = "default";

/// Counts turns in a history-backed slot and echoes each message back.
pub struct EchoTurn;

#[async_trait]
impl Middleware for EchoTurn {
    async fn on_turn(
        &self,
        ctx: &mut TurnContext,
        next: Next<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let text = ctx.activity().text.clone().unwrap_or_default();

        let count = ctx
            .slot_value(SCOPE, NAMESPACE, "turn_count")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            + 1;

        ctx.set_slot(SCOPE, NAMESPACE, "turn_count", json!(count))
            .await?;
        ctx.set_slot(SCOPE, NAMESPACE, "last_message", json!(text))
            .await?;
        ctx.queue_reply(format!("[turn {count}] {text}"));

        next.run(ctx, cancel).await
    }
}
