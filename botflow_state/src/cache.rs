//! Per-conversation frame cache with hash-based dirty detection.
//!
//! The cache mediates every read and write of frame state. Payloads are
//! fetched from the backing store at most once per cached lifetime, and
//! written back only when the content hash of the in-memory payload
//! differs from what was last persisted. Turns that read but never
//! meaningfully change a frame cost zero persistence I/O.

use crate::error::{Result, StateError};
use crate::frame::{Frame, FrameState, HistoryEntry};
use crate::history::apply_history;
use botflow_core::{BackingStore, StateKey, content_hash};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// In-memory record for one frame instance of one conversation.
#[derive(Debug, Clone)]
pub struct CachedFrameState {
    /// Raw serialized payload, opaque to the cache
    pub state: Vec<u8>,
    /// Content hash as of the last load or successful flush
    pub hash: String,
    /// Whether any read or write occurred since load or last flush
    pub accessed: bool,
}

/// What a flush did for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Entry was never accessed since load or last flush; no I/O
    Clean,
    /// Entry was accessed but the payload hash is unchanged; no I/O
    Unchanged,
    /// Payload persisted to the backing store
    Written,
}

type EntrySlot = Arc<Mutex<Option<CachedFrameState>>>;

/// Frame state cache over a [`BackingStore`].
///
/// Operations on the same key serialize on a per-key async lock; turns for
/// different conversations proceed in parallel. The outer registry lock
/// only guards the key map and is never held across I/O.
pub struct FrameCache {
    store: Arc<dyn BackingStore>,
    entries: StdMutex<HashMap<StateKey, EntrySlot>>,
}

impl FrameCache {
    #[must_use]
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            store,
            entries: StdMutex::new(HashMap::new()),
        }
    }

    fn entry_slot(&self, key: &StateKey) -> EntrySlot {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(key.clone()).or_default().clone()
    }

    /// Fetch-and-fill under the per-key lock. A store failure propagates
    /// and leaves the slot empty, so the next load retries the fetch.
    async fn ensure_loaded<'a>(
        &self,
        key: &StateKey,
        slot: &'a mut Option<CachedFrameState>,
    ) -> Result<&'a mut CachedFrameState> {
        if slot.is_none() {
            let raw = self.store.get(key).await?.unwrap_or_default();
            let hash = content_hash(&raw);
            debug!("Loaded frame state for {key} ({} bytes)", raw.len());
            *slot = Some(CachedFrameState {
                state: raw,
                hash,
                accessed: false,
            });
        }
        match slot.as_mut() {
            Some(entry) => Ok(entry),
            None => unreachable!("slot filled above"),
        }
    }

    /// Ensure an entry exists for `key`, fetching from the backing store
    /// on first access. Already-cached entries are returned as-is, never
    /// re-fetched.
    pub async fn load(&self, key: &StateKey) -> Result<()> {
        let slot = self.entry_slot(key);
        let mut guard = slot.lock().await;
        self.ensure_loaded(key, &mut guard).await?;
        Ok(())
    }

    /// Read the raw payload, marking the entry as accessed.
    pub async fn read(&self, key: &StateKey) -> Result<Vec<u8>> {
        let slot = self.entry_slot(key);
        let mut guard = slot.lock().await;
        let entry = self.ensure_loaded(key, &mut guard).await?;
        entry.accessed = true;
        Ok(entry.state.clone())
    }

    /// Replace the raw payload, marking the entry as accessed.
    ///
    /// Hash recomputation is deferred to [`Self::flush`]; a turn may write
    /// a frame many times and only the final payload is ever hashed.
    pub async fn write(&self, key: &StateKey, new_state: Vec<u8>) -> Result<()> {
        let slot = self.entry_slot(key);
        let mut guard = slot.lock().await;
        let entry = self.ensure_loaded(key, &mut guard).await?;
        entry.state = new_state;
        entry.accessed = true;
        Ok(())
    }

    /// Write the entry back to the backing store if it changed.
    ///
    /// No store traffic when the entry was never accessed, or when the
    /// payload hashes identically to what was last persisted. A store
    /// failure leaves `hash` and `accessed` untouched, so a retried flush
    /// re-attempts the same comparison.
    pub async fn flush(&self, key: &StateKey) -> Result<FlushOutcome> {
        let slot = self.entry_slot(key);
        let mut guard = slot.lock().await;
        let Some(entry) = guard.as_mut() else {
            return Ok(FlushOutcome::Clean);
        };
        if !entry.accessed {
            return Ok(FlushOutcome::Clean);
        }

        let new_hash = content_hash(&entry.state);
        if new_hash == entry.hash {
            entry.accessed = false;
            debug!("Flush skipped for {key}: payload unchanged");
            return Ok(FlushOutcome::Unchanged);
        }

        self.store.put(key, &entry.state).await?;
        entry.hash = new_hash;
        entry.accessed = false;
        debug!("Flushed frame state for {key} ({} bytes)", entry.state.len());
        Ok(FlushOutcome::Written)
    }

    /// Flush every cached entry of one conversation. Returns the number of
    /// entries actually written to the backing store.
    pub async fn flush_conversation(&self, conversation_id: &str) -> Result<usize> {
        let keys: Vec<StateKey> = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .keys()
                .filter(|k| k.conversation_id == conversation_id)
                .cloned()
                .collect()
        };

        let mut written = 0;
        for key in keys {
            if self.flush(&key).await? == FlushOutcome::Written {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Evict every cached entry of one conversation.
    pub fn close_conversation(&self, conversation_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|k, _| k.conversation_id != conversation_id);
        info!("Closed conversation: {conversation_id}");
    }

    /// Evict everything.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Snapshot of a cached entry, if one exists. Diagnostic surface; does
    /// not count as an access.
    pub async fn peek(&self, key: &StateKey) -> Option<CachedFrameState> {
        let slot = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.get(key).cloned()
        }?;
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Set a slot's current value, applying its history policy.
    ///
    /// The full read-modify-write runs under the per-key lock, so two
    /// concurrent turns on the same key cannot silently lose a write.
    /// Rejects slot names with no matching definition in `frame`.
    pub async fn set_slot(
        &self,
        key: &StateKey,
        frame: &Frame,
        slot_name: &str,
        value: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(definition) = frame.slot(slot_name) else {
            return Err(StateError::UndefinedSlot {
                scope: frame.scope.clone(),
                namespace: frame.namespace.clone(),
                slot: slot_name.to_string(),
            });
        };

        let slot = self.entry_slot(key);
        let mut guard = slot.lock().await;
        let entry = self.ensure_loaded(key, &mut guard).await?;

        let mut state = FrameState::decode(&entry.state)?;
        let slot_value = state.slots.entry(slot_name.to_string()).or_default();

        if let Some(policy) = definition.history_policy {
            slot_value.history =
                apply_history(policy, &slot_value.history, value.clone(), now, now);
        }
        slot_value.current = value;

        entry.state = state.encode()?;
        entry.accessed = true;
        Ok(())
    }

    /// Current value of a slot, if set.
    pub async fn slot_value(
        &self,
        key: &StateKey,
        slot_name: &str,
    ) -> Result<Option<serde_json::Value>> {
        let state = FrameState::decode(&self.read(key).await?)?;
        Ok(state.value(slot_name).cloned())
    }

    /// Retained history of a slot, oldest first.
    pub async fn slot_history(
        &self,
        key: &StateKey,
        slot_name: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let state = FrameState::decode(&self.read(key).await?)?;
        Ok(state.history(slot_name).to_vec())
    }

    /// Decoded view of a cached frame, marking it as accessed.
    pub async fn read_frame(&self, key: &StateKey) -> Result<FrameState> {
        Ok(FrameState::decode(&self.read(key).await?)?)
    }

    /// Encode and store a decoded frame state.
    pub async fn write_frame(&self, key: &StateKey, state: &FrameState) -> Result<()> {
        self.write(key, state.encode()?).await
    }
}

impl std::fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .entries
            .lock()
            .map(|e| e.len())
            .unwrap_or_default();
        f.debug_struct("FrameCache").field("entries", &count).finish()
    }
}
