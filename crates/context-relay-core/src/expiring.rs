//! A map whose entries expire after a period without writes.
//!
//! [`ExpiringMap`] is the shared eviction policy behind both the
//! conversation store and the seen set:
//!
//! - **Age**: an entry whose last write is older than `max_age` is treated
//!   as absent by every read, whether or not it has been swept yet.
//! - **Count** (optional): once `max_entries` is reached, inserting a new key
//!   evicts the oldest-inserted key first.
//! - **Sweep**: [`ExpiringMap::sweep`] physically drops expired entries.
//!   Reads never depend on it having run.
//!
//! The map itself is not synchronized; owners wrap it in a lock.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

struct Slot<V> {
    value: V,
    seq: u64,
    last_touched: DateTime<Utc>,
}

pub struct ExpiringMap<K, V> {
    entries: HashMap<K, Slot<V>>,
    /// Insertion order as `(key, seq)`. Pairs whose seq no longer matches
    /// the live slot are stale and skipped.
    order: VecDeque<(K, u64)>,
    max_entries: Option<usize>,
    max_age: Duration,
    next_seq: u64,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: None,
            max_age,
            next_seq: 0,
        }
    }

    /// Bound the number of live keys; the oldest-inserted key is evicted
    /// when a new key would exceed `max_entries`.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn expired(&self, last_touched: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_touched > self.max_age
    }

    /// Read a live entry without touching it.
    pub fn get<Q>(&self, key: &Q, now: DateTime<Utc>) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|slot| !self.expired(slot.last_touched, now))
            .map(|slot| &slot.value)
    }

    pub fn contains<Q>(&self, key: &Q, now: DateTime<Utc>) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get(key, now).is_some()
    }

    /// Fetch the entry for `key` for writing, creating it with `init` if
    /// absent. An expired entry is handed to `reset` first and then counts
    /// as freshly inserted. Either way the entry's last-write time becomes
    /// `now`.
    ///
    /// Returns the entry and whether it was new (absent or expired).
    pub fn touch_or_insert_with(
        &mut self,
        key: K,
        now: DateTime<Utc>,
        init: impl FnOnce() -> V,
        reset: impl FnOnce(&mut V),
    ) -> (&mut V, bool) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let max_age = self.max_age;
        let expired = self
            .entries
            .get(&key)
            .map(|slot| now - slot.last_touched > max_age);

        if expired.is_none() {
            if let Some(max) = self.max_entries {
                while self.entries.len() >= max && self.evict_oldest() {}
            }
        }
        let fresh = expired != Some(false);
        if fresh {
            self.order.push_back((key.clone(), seq));
        }

        let slot = match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let slot = occupied.into_mut();
                if fresh {
                    reset(&mut slot.value);
                    slot.seq = seq;
                }
                slot
            }
            Entry::Vacant(vacant) => vacant.insert(Slot {
                value: init(),
                seq,
                last_touched: now,
            }),
        };
        slot.last_touched = now;
        (&mut slot.value, fresh)
    }

    /// Remove the oldest-inserted live key. Returns `false` if nothing
    /// could be evicted.
    fn evict_oldest(&mut self) -> bool {
        while let Some((key, seq)) = self.order.pop_front() {
            let live = self.entries.get(&key).is_some_and(|slot| slot.seq == seq);
            if live {
                self.entries.remove(&key);
                return true;
            }
        }
        false
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.entries.remove(key).map(|slot| slot.value);
        if removed.is_some() {
            self.order.retain(|(k, _)| Borrow::<Q>::borrow(k) != key);
        }
        removed
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let max_age = self.max_age;
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| now - slot.last_touched <= max_age);
        let entries = &self.entries;
        self.order
            .retain(|(k, seq)| entries.get(k).is_some_and(|slot| slot.seq == *seq));
        before - self.entries.len()
    }

    /// Number of physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Something the background sweeper can clean up.
pub trait Sweep: Send + Sync {
    /// Short name used in log lines.
    fn label(&self) -> &str;

    /// Physically remove expired entries; returns how many were removed.
    fn sweep_expired(&self) -> usize;
}
