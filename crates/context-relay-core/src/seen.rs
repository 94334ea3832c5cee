//! De-duplication of inbound event and message identifiers.
//!
//! Chat platforms redeliver events; a [`SeenSet`] remembers which
//! identifiers were already handled. It uses the same [`ExpiringMap`]
//! policy as the conversation store: entries expire after `max_age` and
//! at most `max_entries` are kept, oldest first out.

use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::expiring::{ExpiringMap, Sweep};

pub struct SeenSet {
    ids: Mutex<ExpiringMap<String, ()>>,
    clock: Arc<dyn Clock>,
}

impl SeenSet {
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self::with_clock(max_entries, max_age, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ids: Mutex::new(ExpiringMap::new(max_age).with_max_entries(max_entries)),
            clock,
        }
    }

    /// Record `id`. Returns `true` the first time it is seen, `false` for
    /// a duplicate still within `max_age`.
    pub fn mark(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut ids = self.ids.lock();
        if ids.contains(id, now) {
            return false;
        }
        ids.touch_or_insert_with(id.to_string(), now, || (), |_| {}).1
    }

    pub fn contains(&self, id: &str) -> bool {
        let now = self.clock.now();
        self.ids.lock().contains(id, now)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}

impl Sweep for SeenSet {
    fn label(&self) -> &str {
        "seen-ids"
    }

    fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        self.ids.lock().sweep(now)
    }
}
