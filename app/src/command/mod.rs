//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use crate::echo::EchoTurn;
use botflow_config::Config;
use botflow_core::MemoryStore;
use botflow_pipeline::{FrameRegistry, TurnLogging, TurnPipeline, TurnProcessor};
use botflow_state::cache::FrameCache;
use botflow_state::{Frame, SlotDefinition, SlotHistoryPolicy};
use std::sync::Arc;

mod chat;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Contract for all command strategies.
///
/// Each strategy defines its own input type, enabling type-safe parameter
/// passing without boxing; calls are monomorphized at compile time.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Build the turn processor the console channel drives.
///
/// The conversation frame carries a history-backed turn counter (retention
/// from config) and a latest-value-only message slot.
fn build_processor(config: &Config) -> TurnProcessor {
    let policy = SlotHistoryPolicy::keep_last(config.state.history_max_count)
        .with_ttl(config.state.history_expires_after_secs);

    let frames = FrameRegistry::new().with_frame(
        Frame::new("conversation", "default")
            .with_slot(SlotDefinition::new("turn_count").with_history(policy))
            .with_slot(SlotDefinition::new("last_message")),
    );

    let cache = Arc::new(FrameCache::new(Arc::new(MemoryStore::new())));
    let pipeline = TurnPipeline::new().with(TurnLogging).with(EchoTurn);

    TurnProcessor::new(pipeline, cache, frames)
}
