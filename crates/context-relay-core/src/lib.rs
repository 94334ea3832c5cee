//! # Context Relay Core
//!
//! Pure, in-memory logic for Context Relay: data models, the section-aware
//! chunker, the keyword tokenizer, the inverted index and its lexical search,
//! and the bounded, age-expiring stores used for conversation memory and
//! event de-duplication.
//!
//! This crate performs no filesystem or network I/O and carries no async
//! runtime. Corpus sources are supplied by the application through the
//! [`connector::Connector`] trait.

pub mod chunk;
pub mod clock;
pub mod connector;
pub mod conversation;
pub mod error;
pub mod expiring;
pub mod index;
pub mod keywords;
pub mod models;
pub mod search;
pub mod seen;
