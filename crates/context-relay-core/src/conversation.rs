//! Bounded, age-expiring message history per conversation thread.
//!
//! Each thread keeps at most `max_messages` messages (oldest dropped
//! first). A thread that has not been written to for longer than
//! `max_age` reads as empty.
//!
//! Reads and writes treat a stale thread differently:
//!
//! - [`add_message`](ConversationStore::add_message) clears the stale
//!   history, then appends, so the thread starts over.
//! - [`get_messages`](ConversationStore::get_messages) returns an empty
//!   list but leaves the stored messages in place until the next write or
//!   sweep.
//!
//! # Concurrency
//!
//! One `RwLock` guards the thread map. Writes and sweeps take it
//! exclusively; reads share it.
//!
//! ```rust
//! use context_relay_core::conversation::ConversationStore;
//! use context_relay_core::models::Role;
//! use chrono::Duration;
//!
//! let store = ConversationStore::new(20, Duration::hours(1));
//! store.add_message("thread-1", Role::User, "hello");
//! store.add_message("thread-1", Role::Assistant, "hi there");
//! assert_eq!(store.get_messages("thread-1").len(), 2);
//! assert!(store.get_messages("thread-2").is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::expiring::{ExpiringMap, Sweep};
use crate::models::{Message, Role};

pub struct ConversationStore {
    threads: RwLock<ExpiringMap<String, VecDeque<Message>>>,
    max_messages: usize,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    /// Create a store on the system clock.
    pub fn new(max_messages: usize, max_age: Duration) -> Self {
        Self::with_clock(max_messages, max_age, Arc::new(SystemClock))
    }

    pub fn with_clock(max_messages: usize, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            threads: RwLock::new(ExpiringMap::new(max_age)),
            max_messages: max_messages.max(1),
            clock,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn max_age(&self) -> Duration {
        self.threads.read().max_age()
    }

    /// Append a message to `thread_id`, creating the thread if needed.
    ///
    /// Every call appends; callers must not record the same turn twice.
    pub fn add_message(&self, thread_id: &str, role: Role, content: impl Into<String>) {
        let now = self.clock.now();
        let mut threads = self.threads.write();
        let (messages, fresh) = threads.touch_or_insert_with(
            thread_id.to_string(),
            now,
            VecDeque::new,
            VecDeque::clear,
        );
        if fresh {
            debug!(thread_id, "starting conversation thread");
        }

        messages.push_back(Message {
            role,
            content: content.into(),
            timestamp: now,
        });
        while messages.len() > self.max_messages {
            messages.pop_front();
        }
    }

    /// Messages of `thread_id`, oldest first; empty if unknown or expired.
    pub fn get_messages(&self, thread_id: &str) -> Vec<Message> {
        let now = self.clock.now();
        self.threads
            .read()
            .get(thread_id, now)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a thread's history immediately.
    pub fn clear(&self, thread_id: &str) -> bool {
        self.threads.write().remove(thread_id).is_some()
    }

    /// Number of stored threads, including expired ones not yet swept.
    pub fn thread_count(&self) -> usize {
        self.threads.read().len()
    }

    /// Remove every thread older than `max_age`.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        self.threads.write().sweep(now)
    }
}

impl Sweep for ConversationStore {
    fn label(&self) -> &str {
        "conversations"
    }

    fn sweep_expired(&self) -> usize {
        self.cleanup()
    }
}
