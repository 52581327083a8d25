//! Backing store abstraction for persisted frame state.
//!
//! The cache layer talks to durable storage exclusively through
//! [`BackingStore`], keyed by a conversation-scoped [`StateKey`]. The store
//! imposes no schema on the payload bytes; per-key atomic write is the only
//! guarantee the cache relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

/// Addressing triple for one frame of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub conversation_id: String,
    pub scope: String,
    pub namespace: String,
}

impl StateKey {
    /// Create a key for `(conversation, scope, namespace)`.
    #[must_use]
    pub fn new(
        conversation_id: impl Into<String>,
        scope: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            scope: scope.into(),
            namespace: namespace.into(),
        }
    }

    /// Render the flat storage key.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.conversation_id, self.scope, self.namespace)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Durable key/value persistence for raw frame payloads.
///
/// Implementations must provide per-key atomic writes. `get` returns `None`
/// for keys that were never written.
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StoreError>;
    async fn put(&self, key: &StateKey, raw: &[u8]) -> Result<(), StoreError>;
    async fn delete(&self, key: &StateKey) -> Result<(), StoreError>;
}

/// In-memory backing store.
///
/// The reference implementation used by tests and the console channel.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(&key.storage_key()).cloned())
    }

    async fn put(&self, key: &StateKey, raw: &[u8]) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.storage_key(), raw.to_vec());
        debug!("Stored {} bytes for {key}", raw.len());
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<(), StoreError> {
        self.entries.write().await.remove(&key.storage_key());
        debug!("Deleted entry for {key}");
        Ok(())
    }
}
