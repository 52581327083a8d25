#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod builtin;
pub mod context;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod processor;

pub use builtin::{StateFlush, TurnLogging};
pub use context::{FrameRegistry, TurnContext};
pub use error::PipelineError;
pub use middleware::{Middleware, Next, NoopHandler, TurnHandler};
pub use pipeline::{TurnOutcome, TurnPipeline};
pub use processor::{TurnProcessor, TurnReport};
