//! The relay's application facade.
//!
//! [`ContextService`] owns the document index, the conversation store and
//! the seen-id set, and turns an incoming chat message into a grounded
//! prompt:
//!
//! ```text
//!   prepare(thread, msg):  history(thread) ─┐
//!                          search(msg, K) ──┼─▶ system prompt + messages
//!                                           │
//!   record_turn(thread, user, reply) ───────┴─▶ history(thread) += 2
//! ```
//!
//! All three components are shared behind `Arc`, so a service can be
//! cloned cheaply into request handlers and the background sweeper.

use chrono::Duration;
use context_relay_core::connector::Connector;
use context_relay_core::conversation::ConversationStore;
use context_relay_core::error::IngestError;
use context_relay_core::expiring::Sweep;
use context_relay_core::index::{DocumentIndex, IngestReport};
use context_relay_core::models::{Role, SearchHit};
use context_relay_core::seen::SeenSet;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::prompt::{
    build_system_prompt, compose_messages, truncate_reply, PromptMessage, DEFAULT_SYSTEM_PROMPT,
};
use crate::sweeper;

/// Everything a caller needs to send one grounded request to a model.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub system: String,
    pub messages: Vec<PromptMessage>,
    /// Titles of the retrieved documents, in rank order, without repeats.
    pub sources: Vec<String>,
    pub hits: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct ContextService {
    index: Arc<DocumentIndex>,
    conversations: Arc<ConversationStore>,
    seen: Arc<SeenSet>,
    max_context_chunks: usize,
    system_prompt: String,
    reply_limit: usize,
    reply_keep: usize,
    sweep_interval: std::time::Duration,
}

impl ContextService {
    pub fn from_config(config: &Config) -> Self {
        let conversations = ConversationStore::new(
            config.conversation.max_messages,
            secs(config.conversation.max_age_secs),
        );
        let seen = SeenSet::new(config.dedup.max_entries, secs(config.dedup.max_age_secs));
        Self::with_parts(
            config,
            Arc::new(DocumentIndex::new(config.chunking.chunk_size)),
            Arc::new(conversations),
            Arc::new(seen),
        )
    }

    /// Build a service around existing components.
    pub fn with_parts(
        config: &Config,
        index: Arc<DocumentIndex>,
        conversations: Arc<ConversationStore>,
        seen: Arc<SeenSet>,
    ) -> Self {
        Self {
            index,
            conversations,
            seen,
            max_context_chunks: config.retrieval.max_context_chunks,
            system_prompt: config
                .prompt
                .system
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            reply_limit: config.prompt.reply_limit,
            reply_keep: config.prompt.reply_keep,
            sweep_interval: std::time::Duration::from_secs(
                config.conversation.sweep_interval_secs,
            ),
        }
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    /// Replace the index with the documents of `connector`.
    pub fn reload(&self, connector: &dyn Connector) -> Result<IngestReport, IngestError> {
        self.index.ingest(connector)
    }

    /// Compose the prompt for `message` arriving on `thread_id`.
    ///
    /// Does not record the message; call [`record_turn`](Self::record_turn)
    /// once the reply is known.
    pub fn prepare(&self, thread_id: &str, message: &str) -> PreparedPrompt {
        let history = self.conversations.get_messages(thread_id);
        let hits = self.index.search(message, self.max_context_chunks);
        let system = build_system_prompt(&self.system_prompt, &hits);
        let messages = compose_messages(&system, &history, message);

        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.title) {
                sources.push(hit.title.clone());
            }
        }

        debug!(
            thread_id,
            history = history.len(),
            hits = hits.len(),
            "prepared prompt"
        );

        PreparedPrompt {
            system,
            messages,
            sources,
            hits,
        }
    }

    /// Record a completed exchange. The reply is truncated before it is
    /// stored; the stored form is returned for delivery.
    pub fn record_turn(&self, thread_id: &str, user_message: &str, reply: &str) -> String {
        let reply = truncate_reply(reply, self.reply_limit, self.reply_keep);
        self.conversations
            .add_message(thread_id, Role::User, user_message);
        self.conversations
            .add_message(thread_id, Role::Assistant, reply.clone());
        reply
    }

    /// `true` the first time an event id is seen, `false` for a redelivery.
    pub fn mark_seen(&self, event_id: &str) -> bool {
        self.seen.mark(event_id)
    }

    pub fn sweep_targets(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            self.conversations.clone() as Arc<dyn Sweep>,
            self.seen.clone() as Arc<dyn Sweep>,
        ]
    }

    /// How often the background sweeper runs (`conversation.sweep_interval_secs`).
    pub fn sweep_interval(&self) -> std::time::Duration {
        self.sweep_interval
    }

    /// Start the background sweeper over this service's stores at
    /// [`sweep_interval`](Self::sweep_interval).
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        sweeper::spawn_sweeper(self.sweep_targets(), self.sweep_interval)
    }
}

/// Seconds as a `chrono::Duration`, saturating at `Duration::MAX`.
fn secs(value: u64) -> Duration {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_relay_core::clock::ManualClock;
    use context_relay_core::connector::MemoryCorpus;

    fn kb() -> MemoryCorpus {
        MemoryCorpus::new([
            (
                "refunds.md",
                "# Refund Policy\nRefunds are processed within five business days \
                 after the request is approved.",
            ),
            (
                "login.md",
                "# Login Help\nReset your password from the login page if you \
                 cannot sign in.",
            ),
        ])
    }

    fn service() -> ContextService {
        let service = ContextService::from_config(&Config::default());
        service.reload(&kb()).unwrap();
        service
    }

    #[test]
    fn test_prepare_grounds_prompt() {
        let service = service();
        let prepared = service.prepare("t1", "how do refunds work");
        assert_eq!(prepared.hits[0].doc_path, "refunds.md");
        assert_eq!(prepared.sources, vec!["Refund Policy".to_string()]);
        assert!(prepared
            .system
            .contains("--- Document 1: Refund Policy ---"));
        assert_eq!(prepared.messages.len(), 2);
        assert_eq!(prepared.messages[1].content, "how do refunds work");
    }

    #[test]
    fn test_prepare_without_hits_uses_base_prompt() {
        let service = service();
        let prepared = service.prepare("t1", "hello");
        assert!(prepared.hits.is_empty());
        assert_eq!(prepared.system, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_record_turn_feeds_history() {
        let service = service();
        service.record_turn("t1", "how do refunds work", "Five business days.");
        let prepared = service.prepare("t1", "and for login?");
        let roles: Vec<&str> = prepared.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(prepared.messages[2].content, "Five business days.");

        let other = service.prepare("t2", "and for login?");
        assert_eq!(other.messages.len(), 2);
    }

    #[test]
    fn test_record_turn_truncates_long_reply() {
        let service = service();
        let stored = service.record_turn("t1", "q", &"x".repeat(5000));
        assert!(stored.len() < 5000);
        let history = service.conversations().get_messages("t1");
        assert_eq!(history[1].content, stored);
    }

    #[test]
    fn test_history_expires() {
        let config = Config::default();
        let clock = Arc::new(ManualClock::default());
        let conversations = Arc::new(ConversationStore::with_clock(
            20,
            Duration::seconds(60),
            clock.clone(),
        ));
        let service = ContextService::with_parts(
            &config,
            Arc::new(DocumentIndex::new(1000)),
            conversations,
            Arc::new(SeenSet::new(10, Duration::seconds(60))),
        );
        service.record_turn("t1", "hi", "hello");
        clock.advance(Duration::seconds(61));
        assert_eq!(service.prepare("t1", "again").messages.len(), 2);
        assert_eq!(sweeper::sweep_once(&service.sweep_targets()), 1);
    }

    #[test]
    fn test_secs_saturates() {
        assert_eq!(secs(90), Duration::seconds(90));
        assert_eq!(secs(10_000_000_000_000_000), Duration::MAX);
        assert_eq!(secs(u64::MAX), Duration::MAX);
    }

    #[test]
    fn test_huge_max_age_does_not_panic() {
        let mut config = Config::default();
        config.conversation.max_age_secs = 10_000_000_000_000_000;
        config.dedup.max_age_secs = u64::MAX;
        let service = ContextService::from_config(&config);
        assert_eq!(service.conversations().max_age(), Duration::MAX);
        service.record_turn("t1", "hi", "hello");
        assert_eq!(service.prepare("t1", "again").messages.len(), 4);
        assert!(service.mark_seen("evt-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_sweeper_uses_configured_interval() {
        let mut config = Config::default();
        config.conversation.sweep_interval_secs = 120;
        let clock = Arc::new(ManualClock::default());
        let conversations = Arc::new(ConversationStore::with_clock(
            20,
            Duration::seconds(60),
            clock.clone(),
        ));
        let service = ContextService::with_parts(
            &config,
            Arc::new(DocumentIndex::new(1000)),
            conversations,
            Arc::new(SeenSet::new(10, Duration::seconds(60))),
        );
        assert_eq!(service.sweep_interval(), std::time::Duration::from_secs(120));

        service.record_turn("t1", "hi", "hello");
        clock.advance(Duration::seconds(61));
        let handle = service.spawn_sweeper();

        tokio::time::sleep(std::time::Duration::from_secs(100)).await;
        assert_eq!(service.conversations().thread_count(), 1);

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(service.conversations().thread_count(), 0);

        handle.abort();
    }

    #[test]
    fn test_mark_seen() {
        let service = service();
        assert!(service.mark_seen("evt-1"));
        assert!(!service.mark_seen("evt-1"));
    }
}
