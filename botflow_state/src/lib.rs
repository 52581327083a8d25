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

pub mod cache;
pub mod error;
pub mod frame;
pub mod history;

pub use cache::{CachedFrameState, FlushOutcome, FrameCache};
pub use error::{Result, StateError};
pub use frame::{Frame, FrameState, HistoryEntry, SlotDefinition, SlotHistoryPolicy, SlotValue};
pub use history::apply_history;
