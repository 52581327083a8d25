use botflow_state::StateError;
use thiserror::Error;

/// Errors escaping a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unhandled fault raised by a middleware unit or terminal handler.
    /// Propagates synchronously; no remaining middleware executes.
    #[error("middleware fault: {0}")]
    Fault(#[from] anyhow::Error),

    /// The turn's cancellation signal fired; the chain stopped before
    /// starting another unit.
    #[error("turn cancelled")]
    Cancelled,

    /// State access failed (store unavailable, undefined slot, codec).
    #[error(transparent)]
    State(#[from] StateError),
}
