//! Slot history retention.
//!
//! Pure append-and-evict over a slot's historical values. No I/O; the
//! cache layer calls this on every write to a slot that carries a
//! [`SlotHistoryPolicy`].

use crate::frame::{HistoryEntry, SlotHistoryPolicy};
use chrono::{DateTime, Utc};

/// Append a value to a slot's history and apply the retention policy.
///
/// `existing` is ordered oldest to newest; the result preserves that
/// ordering. Eviction runs in two passes: entries older than the TTL are
/// dropped first (skipped when `expires_after_secs` is zero), then the
/// oldest survivors are dropped until the count cap is met. A cap of zero
/// retains only the entry appended by this call.
#[must_use]
pub fn apply_history(
    policy: SlotHistoryPolicy,
    existing: &[HistoryEntry],
    new_value: serde_json::Value,
    written_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    let mut history: Vec<HistoryEntry> = existing.to_vec();
    history.push(HistoryEntry {
        value: new_value,
        written_at,
    });

    if policy.expires_after_secs > 0 {
        let ttl = i64::try_from(policy.expires_after_secs).unwrap_or(i64::MAX);
        history.retain(|entry| (now - entry.written_at).num_seconds() <= ttl);
    }

    let cap = if policy.max_count == 0 {
        1
    } else {
        policy.max_count
    };
    if history.len() > cap {
        history.drain(..history.len() - cap);
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn entry(value: serde_json::Value, at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            value,
            written_at: at,
        }
    }

    #[test]
    fn count_cap_drops_oldest() {
        let policy = SlotHistoryPolicy::keep_last(2);
        let now = Utc::now();

        let mut history = Vec::new();
        for (i, v) in ["v1", "v2", "v3"].iter().enumerate() {
            let at = now + Duration::seconds(i64::try_from(i).unwrap_or(0));
            history = apply_history(policy, &history, json!(v), at, at);
        }

        let values: Vec<_> = history.iter().map(|e| e.value.clone()).collect();
        assert_eq!(values, vec![json!("v2"), json!("v3")]);
    }

    #[test]
    fn ttl_evicts_below_count_cap() {
        let policy = SlotHistoryPolicy::keep_last(10).with_ttl(60);
        let now = Utc::now();

        let stale = entry(json!("old"), now - Duration::seconds(61));
        let history = apply_history(policy, &[stale], json!("new"), now, now);

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, json!("new"));
    }

    #[test]
    fn ttl_boundary_is_inclusive() {
        // Age exactly equal to the TTL is not yet expired.
        let policy = SlotHistoryPolicy::keep_last(10).with_ttl(60);
        let now = Utc::now();

        let aging = entry(json!("aging"), now - Duration::seconds(60));
        let history = apply_history(policy, &[aging], json!("new"), now, now);

        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let policy = SlotHistoryPolicy::keep_last(10);
        let now = Utc::now();

        let ancient = entry(json!("ancient"), now - Duration::days(365));
        let history = apply_history(policy, &[ancient], json!("new"), now, now);

        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_count_retains_only_newest() {
        let policy = SlotHistoryPolicy::keep_last(0);
        let now = Utc::now();

        let mut history = Vec::new();
        for v in ["v1", "v2"] {
            history = apply_history(policy, &history, json!(v), now, now);
        }

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, json!("v2"));
    }

    #[test]
    fn both_passes_run_ttl_first() {
        // Three live entries plus one stale: the TTL pass removes the stale
        // entry before the count cap decides which survivors to keep.
        let policy = SlotHistoryPolicy::keep_last(2).with_ttl(100);
        let now = Utc::now();

        let existing = vec![
            entry(json!("stale"), now - Duration::seconds(200)),
            entry(json!("a"), now - Duration::seconds(30)),
            entry(json!("b"), now - Duration::seconds(20)),
        ];
        let history = apply_history(policy, &existing, json!("c"), now, now);

        let values: Vec<_> = history.iter().map(|e| e.value.clone()).collect();
        assert_eq!(values, vec![json!("b"), json!("c")]);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let policy = SlotHistoryPolicy::keep_last(3).with_ttl(60);
        let now = Utc::now();
        let existing = vec![entry(json!("a"), now - Duration::seconds(10))];

        let h1 = apply_history(policy, &existing, json!("b"), now, now);
        let h2 = apply_history(policy, &existing, json!("b"), now, now);
        assert_eq!(h1, h2);
    }
}
