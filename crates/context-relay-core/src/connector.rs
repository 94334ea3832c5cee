//! Corpus sources for the document index.
//!
//! A [`Connector`] produces the ordered `(identifier, text)` pairs the
//! index ingests. How they are obtained (archive, directory, network) is
//! the connector's business. A connector distinguishes two failure kinds:
//!
//! - the corpus as a whole cannot be read: return [`IngestError`];
//! - a single document cannot be read: record it in
//!   [`Corpus::skipped`] and carry on.

use serde::Serialize;

use crate::error::IngestError;
use crate::models::SourceDoc;

/// A document the connector could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub id: String,
    pub reason: String,
}

/// Documents produced by one connector load.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<SourceDoc>,
    pub skipped: Vec<SkippedDocument>,
}

impl Corpus {
    pub fn push(&mut self, doc: SourceDoc) {
        self.documents.push(doc);
    }

    pub fn skip(&mut self, id: impl Into<String>, reason: impl ToString) {
        self.skipped.push(SkippedDocument {
            id: id.into(),
            reason: reason.to_string(),
        });
    }
}

/// A source of documents for ingestion.
///
/// ```rust
/// use context_relay_core::connector::{Connector, Corpus};
/// use context_relay_core::error::IngestError;
/// use context_relay_core::models::SourceDoc;
///
/// struct Fixed;
///
/// impl Connector for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn description(&self) -> &str { "one hardcoded page" }
///     fn load(&self) -> Result<Corpus, IngestError> {
///         let mut corpus = Corpus::default();
///         corpus.push(SourceDoc::new("page.md", "# Page\nBody"));
///         Ok(corpus)
///     }
/// }
/// ```
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Read every document. Called once per ingest.
    fn load(&self) -> Result<Corpus, IngestError>;
}

/// An in-memory connector over fixed pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    docs: Vec<SourceDoc>,
}

impl MemoryCorpus {
    pub fn new<I, A, B>(docs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            docs: docs
                .into_iter()
                .map(|(id, text)| SourceDoc::new(id, text))
                .collect(),
        }
    }
}

impl Connector for MemoryCorpus {
    fn name(&self) -> &str {
        "memory"
    }

    fn description(&self) -> &str {
        "in-memory documents"
    }

    fn load(&self) -> Result<Corpus, IngestError> {
        Ok(Corpus {
            documents: self.docs.clone(),
            skipped: Vec::new(),
        })
    }
}
