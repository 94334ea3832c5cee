//! # Context Relay
//!
//! Contextual retrieval for a chat assistant: an in-memory lexical index
//! over a Markdown knowledge base, plus bounded per-thread conversation
//! memory, combined into a grounded prompt for a language model.
//!
//! The pure logic (chunking, keyword index, search, expiring stores) lives
//! in the `context-relay-core` crate. This crate adds configuration, corpus
//! connectors, prompt composition, the background sweeper and the
//! `relayctx` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ Connectors │──▶│ DocumentIndex │──▶│                │
//! │  ZIP / Dir │   │ chunk+keyword │   │ ContextService │──▶ system prompt
//! └────────────┘   └───────────────┘   │   prepare()    │    + messages
//!                  ┌───────────────┐   │                │
//!                  │ Conversation  │──▶│                │
//!                  │    Store      │   └────────────────┘
//!                  └───────▲───────┘
//!                          │ sweep every 15 min
//!                     ┌────┴────┐
//!                     │ Sweeper │
//!                     └─────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`connector_zip`] | ZIP bundle connector |
//! | [`connector_fs`] | Directory connector |
//! | [`ingest`] | Connector selection and index loading |
//! | [`prompt`] | System prompt and message composition |
//! | [`service`] | The `ContextService` facade |
//! | [`sweeper`] | Periodic removal of expired entries |
//! | [`search`] | `relayctx search` |
//! | [`sources`] | `relayctx sources` |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod connector_fs;
pub mod connector_zip;
pub mod ingest;
pub mod logging;
pub mod prompt;
pub mod search;
pub mod service;
pub mod sources;
pub mod sweeper;
