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

pub mod activity;
pub mod store;
pub mod util;

pub use activity::{Activity, ActivityKind};
pub use store::{BackingStore, MemoryStore, StateKey, StoreError};
pub use util::content_hash;
