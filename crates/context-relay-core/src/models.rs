//! Core data models shared by the index and the conversation store.
//!
//! Documents and chunks flow from a [`Connector`](crate::connector::Connector)
//! through the chunker into an index snapshot. Messages flow through the
//! [`ConversationStore`](crate::conversation::ConversationStore).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownRole;

/// Raw `(identifier, text)` pair handed to the index by a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDoc {
    pub id: String,
    pub text: String,
}

impl SourceDoc {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// An ingested document. Immutable once part of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub path: String,
    pub title: String,
    pub content: String,
    /// Byte length of `content`.
    pub size: usize,
}

/// A bounded passage of one document; the unit of retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `{path}_chunk_{section}` or `{path}_chunk_{section}_{part}`.
    pub id: String,
    pub doc_path: String,
    pub title: String,
    pub text: String,
    pub keywords: BTreeSet<String>,
    /// SHA-256 of `text`, lowercase hex.
    pub hash: String,
}

/// A chunk summary returned from a search, with its query-local score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub doc_path: String,
    pub title: String,
    pub text: String,
    pub score: f64,
}

/// Speaker of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// One message of a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(" Assistant ".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
