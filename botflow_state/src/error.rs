use botflow_core::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no slot definition named '{slot}' in frame {scope}/{namespace}")]
    UndefinedSlot {
        scope: String,
        namespace: String,
        slot: String,
    },

    #[error("no frame registered for {scope}/{namespace}")]
    UnknownFrame { scope: String, namespace: String },

    #[error("frame payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
